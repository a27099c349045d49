/*!
# Event Feedback Sheets

Feedback collection for a conference website: several survey forms append fixed-width
rows to a shared spreadsheet-like store, and a dashboard recomputes summary statistics
from those rows on every request.

## Overview

Each feedback form (overall experience, scientific sessions, catering, exhibition,
oral presentation, poster presentation) writes to its own sheet. Sheets have no column
metadata of their own, so the meaning of every cell is fixed by its position. The
[`schema`] module is the single definition of those positions, shared by the writer
and by every reader.

## Architecture

### Write path
- **Validation Gate** ([`validation`]) - required fields, email syntax, phone digits,
  participation vocabulary, rating range
- **Record Normalizer** ([`normalizer`]) - turns a loose record into a positional row,
  stamping column 0 with the server time
- **Row Store** ([`store`], [`sheets`]) - appends the row in a single call

### Read path
- **Row Store** - fetches every row of the `overall` sheet
- **Aggregation Engine** ([`aggregate`]) - averages, participation distribution,
  recent comments

### Surroundings
- [`config`] - configuration read once at startup
- [`service`] - the submit / fetch / dashboard operations
- [`export`] / [`import`] - CSV and XLSX downloads, CSV import of a downloaded sheet
- [`mailer`] - confirmation mail after a stored submission
- [`app`] - HTTP routes

## REST API Endpoints

- `POST /api/feedback/{category}` - Submit one record
- `GET /api/feedback/{category}/rows` - Fetch every stored row
- `GET /api/feedback/{category}/export?format=csv|xlsx` - Download a sheet
- `GET /api/schema/{category}` - Column layout of a category
- `GET /api/dashboard` - Summary of the `overall` sheet

## Design Highlights

- Append-only rows, no update or delete
- Absent fields become empty cells so positions never shift
- A degraded (empty) dashboard instead of an error page when the store is unreachable
- Header-row skipping is a configuration flag, not a guess
*/

pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod normalizer;
pub mod record;
pub mod schema;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod mailer;
#[cfg(feature = "web")]
pub mod sheets;

pub use aggregate::{AggregateSnapshot, HeaderRow, summarize, summarize_with};
pub use error::{FeedbackError, FieldError, StoreError};
pub use normalizer::{Row, normalize, normalize_at, parse_row};
pub use record::{FieldValue, SubmissionRecord};
pub use schema::{ColumnSchema, FeedbackCategory, ParticipationLevel, schema_for};
pub use service::{FeedbackService, Notifier, Receipt};
pub use store::{FileStore, MemoryStore, RowStore, open_store};
pub use validation::{ValidationResult, validate};
