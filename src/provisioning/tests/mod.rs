//! Unit tests for the provisioning context.
