//! Delivery collaborators
//!
//! Where finished results go: an exporter that stores them somewhere a person
//! can open, and a notifier that tells the requester where to look.

pub mod exporter;
pub mod notifier;

pub use exporter::{ExportError, JsonFileExporter, ResultExporter};
pub use notifier::{Notifier, NotifyError, WebhookNotifier};
