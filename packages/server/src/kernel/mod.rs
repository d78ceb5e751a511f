//! Infrastructure kernel: DI traits, dependency container, job
//! queue/worker machinery and webhook delivery. No business logic;
//! the provisioning pipeline itself lives in `domains::provisioning`.

pub mod deps;
pub mod jobs;
pub mod traits;
pub mod webhook;

pub use deps::{ServerDeps, V0Adapter, VercelAdapter};
pub use traits::{BaseDomainService, BaseGenerationService};
pub use webhook::{WebhookEvent, WebhookNotifier};
