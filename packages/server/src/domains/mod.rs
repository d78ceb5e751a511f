pub mod provisioning;
