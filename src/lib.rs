/*!
# Savings Calculator

A browser-based calculator that shows how an investment grows year by year,
with and without a recurring monthly deposit, and lets users keep named
scenarios either on the server (when logged in) or locally.

## Architecture

### Calculation core
- **schedule**: month-by-month compounding, one summary per completed year
- **validation**: turns raw form fields into checked parameters
- **report**: runs both deposit policies and formats the tables

### Persistence
- **store**: the `ScenarioStore` capability and its error type
- **saving**: local fallback store, gzip-compressed bincode with sequential ids
- **account_store**: per-user JSON lists on the server, UUID ids
- **remote_store**: HTTP client for a server's scenario API
- **session**: picks a store once per session and keeps the sorted collection

### Web layer (feature `web`)
- **login**: accounts with Argon2 hashes and expiring sessions
- **app**: axum routes for the page, calculation, export, auth and scenarios

## REST API Endpoints

- `POST /api/calculate` - Both schedules for the submitted fields
- `POST /api/export?format=csv|xlsx` - Download the schedules
- `POST /api/login` - Obtain a session token
- `GET|POST /api/scenarios`, `DELETE /api/scenarios/{id}` - Saved scenarios
*/

pub mod account_store;
pub mod config;
pub mod downloader;
pub mod logging;
pub mod remote_store;
pub mod report;
pub mod saving;
pub mod scenario;
pub mod schedule;
pub mod session;
pub mod store;
pub mod validation;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod error;
#[cfg(feature = "web")]
pub mod login;

pub use report::{ScheduleReport, format_amount};
pub use scenario::{Scenario, ScenarioParams, SortOrder};
pub use schedule::{ScenarioInput, YearSummary, compute};
pub use store::{ScenarioStore, StorageKind, StoreError};
pub use validation::{ScenarioForm, ValidationError, validate};
