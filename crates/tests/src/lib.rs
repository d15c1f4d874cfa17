//! Workspace-level integration tests

#[cfg(test)]
mod pipeline_integration;
