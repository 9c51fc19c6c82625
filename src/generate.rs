//! The `generate` pipeline.
//!
//! sources + discovered instances → merge → hierarchy check → augmentation
//! → reconciliation. Discovery is the only concurrent stage; everything after
//! it runs on the caller's thread once every scope has finished.

use crate::discovery::{self, InstanceDirectory};
use crate::error::GenerateError;
use crate::profile::augment;
use crate::profile::reconcile::{OutputMode, ReconcileOutcome, reconcile};
use crate::profile::{derive_hierarchy, merge_profiles, storage};
use crate::sources::{self, ProfileGenerator};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use termprof_config::{Config, Profile, Profiles};

/// Where instance profiles come from on this run.
#[derive(Clone)]
pub enum InstanceSource {
    /// Discover live and refresh the cache.
    Live(Arc<dyn InstanceDirectory>),
    /// Reuse the last cached discovery.
    Cached,
}

pub struct Generator {
    config: Config,
    sources: Vec<Box<dyn ProfileGenerator>>,
    cache_path: Option<PathBuf>,
}

impl Generator {
    /// A generator using every source the config enables.
    pub fn new(config: Config) -> Self {
        let sources = sources::default_sources(&config);
        Self::with_sources(config, sources)
    }

    pub fn with_sources(config: Config, sources: Vec<Box<dyn ProfileGenerator>>) -> Self {
        Self {
            config,
            sources,
            cache_path: None,
        }
    }

    /// Override the instance cache location.
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn resolved_cache_path(&self) -> Result<PathBuf, GenerateError> {
        match self.cache_path {
            Some(ref path) => Ok(path.clone()),
            None => storage::default_cache_path(),
        }
    }

    /// Instance profiles, discovered live or read from the cache.
    pub async fn instances(&self, source: InstanceSource) -> Result<Vec<Profile>, GenerateError> {
        let cache_path = self.resolved_cache_path()?;
        match source {
            InstanceSource::Cached => storage::read_instance_cache(&cache_path),
            InstanceSource::Live(directory) => {
                let scopes = discovery::read_scopes(&self.config.aws_config_path());
                let report =
                    discovery::fan_out(directory, scopes, self.config.discovery_concurrency).await;
                if report.failed_workers > 0 {
                    log::warn!("{} discovery workers failed", report.failed_workers);
                }
                storage::write_instance_cache(&cache_path, &report.profiles)?;
                Ok(report.profiles)
            }
        }
    }

    /// Merge, check and augment the candidates from every source plus `instances`.
    pub fn assemble(&self, instances: Vec<Profile>) -> Result<Profiles, GenerateError> {
        let mut candidates = sources::collect(&self.sources);
        candidates.extend(instances);

        let mut profiles = merge_profiles(candidates).profiles;

        {
            let hierarchy = derive_hierarchy(&profiles)?;
            crate::debug_info!(
                "GENERATE",
                "{} login parents with {} dependent profiles",
                hierarchy.len(),
                hierarchy.child_count()
            );
        }

        let standard = augment::standard_triggers(
            &self.config.identity_file_paths(),
            &self.config.remediation_packages,
        );
        let triggers_dir = self.config.triggers_dir_path();
        let extras = triggers_dir.is_dir().then_some(triggers_dir.as_path());
        augment::assign_triggers(&mut profiles, &standard, extras);
        augment::assign_chords(&mut profiles);
        augment::assign_smart_selection(&mut profiles);

        for problem in profiles.iter().flat_map(|p| p.validate()) {
            log::warn!("{}", problem);
        }
        Ok(profiles)
    }

    /// The final collection for this run.
    pub async fn build(&self, source: InstanceSource) -> Result<Profiles, GenerateError> {
        let instances = self.instances(source).await?;
        self.assemble(instances)
    }

    /// Build the collection and apply `mode` to it.
    pub async fn run(
        &self,
        mode: OutputMode,
        source: InstanceSource,
        out: &mut dyn Write,
    ) -> anyhow::Result<ReconcileOutcome> {
        let profiles = self.build(source).await?;
        log::info!("Generated {} profiles", profiles.len());
        reconcile(mode, &profiles, &self.config.output_path(), out)
    }
}
