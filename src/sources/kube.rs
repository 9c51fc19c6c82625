//! One profile per kubeconfig context.

use super::ProfileGenerator;
use serde::Deserialize;
use std::path::PathBuf;
use termprof_config::{Profile, ProfileOrigin};

#[derive(Debug, Default, Deserialize)]
struct KubeConfig {
    #[serde(default)]
    contexts: Vec<NamedContext>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    #[serde(default)]
    context: ContextSpec,
}

#[derive(Debug, Default, Deserialize)]
struct ContextSpec {
    #[serde(default)]
    cluster: String,
    #[serde(default)]
    namespace: Option<String>,
}

pub struct KubeContextSource {
    path: PathBuf,
}

impl KubeContextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Option<KubeConfig> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                crate::debug_log!("K8S", "No kubeconfig at {:?}: {}", self.path, e);
                return None;
            }
        };
        serde_yaml_ng::from_str(&contents)
            .map_err(|e| log::warn!("Failed to parse kubeconfig {:?}: {}", self.path, e))
            .ok()
    }
}

impl ProfileGenerator for KubeContextSource {
    fn label(&self) -> &'static str {
        "k8s"
    }

    fn generate(&self) -> Vec<Profile> {
        let Some(config) = self.load() else {
            return Vec::new();
        };

        config
            .contexts
            .into_iter()
            .filter(|c| !c.name.is_empty())
            .map(|c| {
                let mut profile = Profile::new(format!("k8s-{}", c.name))
                    .initial_text(format!("kubectl config use-context {}", c.name))
                    .tags(["k8s".to_string(), c.context.cluster.clone()]);
                if let Some(ns) = c.context.namespace.filter(|ns| !ns.is_empty()) {
                    profile = profile.badge_text(ns);
                }
                profile.origin(ProfileOrigin::Kube { context: c.name })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: prod
clusters:
  - name: prod-cluster
    cluster:
      server: https://prod.example.com
contexts:
  - name: prod
    context:
      cluster: prod-cluster
      user: admin
      namespace: web
  - name: dev
    context:
      cluster: dev-cluster
"#;

    #[test]
    fn test_contexts_become_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG).unwrap();

        let profiles = KubeContextSource::new(&path).generate();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "k8s-prod");
        assert_eq!(
            profiles[0].initial_text.as_deref(),
            Some("kubectl config use-context prod")
        );
        assert!(profiles[0].tags.contains("prod-cluster"));
        assert_eq!(profiles[0].badge_text.as_deref(), Some("web"));
        assert_eq!(profiles[1].badge_text, None);
    }

    #[test]
    fn test_missing_or_malformed_kubeconfig() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        assert!(KubeContextSource::new(&path).generate().is_empty());

        std::fs::write(&path, "contexts: [not: {valid").unwrap();
        assert!(KubeContextSource::new(&path).generate().is_empty());
    }
}
