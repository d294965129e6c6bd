//! sea-orm entities, one module per table.

// Registries
pub mod client;
pub mod job_site;
pub mod service_catalog;
pub mod worker;

// Quotes and pricing
pub mod phase;
pub mod phase_service_line;
pub mod quote;

// Field work
pub mod allocation;
pub mod production_entry;

// Finance
pub mod payable;
pub mod payable_item;
pub mod receivable;

pub mod audit_log;
