// Structured parsing of image reference strings such as `nginx`, `grafana/grafana:10.4`
// or `ghcr.io/owner/app:main`.

use std::fmt;
use thiserror::Error;

pub const DEFAULT_TAG: &str = "latest";
pub const OFFICIAL_NAMESPACE: &str = "library";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Resolved against the default registry: `repo` (official, namespace
    /// `library`) or `namespace/repo`.
    Default {
        namespace: String,
        repository: String,
        tag: String,
    },
    /// Qualified with its own registry host, which needs its own token and
    /// manifest endpoints.
    Hosted {
        host: String,
        path: String,
        tag: String,
    },
    /// `name[:tag]@digest`. The digest fixes the content, so the tag cannot move it.
    Pinned {
        reference: Box<ImageRef>,
        digest: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageRefError {
    #[error("empty image reference")]
    Empty,
    #[error("image reference {0:?} has an empty path segment or tag")]
    EmptySegment(String),
    #[error("image reference {0:?} has a malformed digest")]
    InvalidDigest(String),
    #[error("image reference {0:?} is an image id, not a repository")]
    ImageId(String),
}

impl ImageRef {
    pub fn parse(reference: &str) -> Result<Self, ImageRefError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ImageRefError::Empty);
        }
        if let Some((name, digest)) = reference.split_once('@') {
            let well_formed = digest
                .split_once(':')
                .is_some_and(|(algorithm, hex)| !algorithm.is_empty() && !hex.is_empty());
            if !well_formed || digest.contains('@') {
                return Err(ImageRefError::InvalidDigest(reference.to_string()));
            }
            return Ok(ImageRef::Pinned {
                reference: Box::new(Self::parse(name)?),
                digest: digest.to_string(),
            });
        }
        if reference.starts_with("sha256:") {
            return Err(ImageRefError::ImageId(reference.to_string()));
        }

        // The tag separator is the last ':' after the last '/'; an earlier ':' is a host port.
        let last_slash = reference.rfind('/');
        let (name, tag) = match reference.rfind(':') {
            Some(colon) if last_slash.is_none_or(|slash| colon > slash) => {
                (&reference[..colon], &reference[colon + 1..])
            }
            _ => (reference, DEFAULT_TAG),
        };
        let segments: Vec<&str> = name.split('/').collect();
        if tag.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(ImageRefError::EmptySegment(reference.to_string()));
        }
        let tag = tag.to_string();

        match segments.as_slice() {
            [repository] => Ok(ImageRef::Default {
                namespace: OFFICIAL_NAMESPACE.to_string(),
                repository: repository.to_string(),
                tag,
            }),
            [first, repository] if !looks_like_host(first) => Ok(ImageRef::Default {
                namespace: first.to_string(),
                repository: repository.to_string(),
                tag,
            }),
            [host, rest @ ..] => Ok(ImageRef::Hosted {
                host: host.to_string(),
                path: rest.join("/"),
                tag,
            }),
            [] => Err(ImageRefError::Empty),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            ImageRef::Default { tag, .. } | ImageRef::Hosted { tag, .. } => tag,
            ImageRef::Pinned { reference, .. } => reference.tag(),
        }
    }

    /// The pinned digest of a `name@digest` reference.
    pub fn pinned_digest(&self) -> Option<&str> {
        match self {
            ImageRef::Pinned { digest, .. } => Some(digest),
            _ => None,
        }
    }

    /// `None` for references served by the default registry.
    pub fn registry_host(&self) -> Option<&str> {
        match self {
            ImageRef::Default { .. } => None,
            ImageRef::Hosted { host, .. } => Some(host),
            ImageRef::Pinned { reference, .. } => reference.registry_host(),
        }
    }

    /// Repository path as used in token scopes and manifest URLs, e.g. `library/nginx`.
    pub fn repository_path(&self) -> String {
        match self {
            ImageRef::Default {
                namespace,
                repository,
                ..
            } => format!("{}/{}", namespace, repository),
            ImageRef::Hosted { path, .. } => path.clone(),
            ImageRef::Pinned { reference, .. } => reference.repository_path(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Default { .. } => write!(f, "{}:{}", self.repository_path(), self.tag()),
            ImageRef::Hosted { host, path, tag } => write!(f, "{}/{}:{}", host, path, tag),
            ImageRef::Pinned { reference, digest } => write!(f, "{}@{}", reference, digest),
        }
    }
}

fn looks_like_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_ref(namespace: &str, repository: &str, tag: &str) -> ImageRef {
        ImageRef::Default {
            namespace: namespace.into(),
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    #[test]
    fn bare_name_is_official_image_with_latest_tag() {
        assert_eq!(
            ImageRef::parse("nginx").unwrap(),
            default_ref("library", "nginx", "latest")
        );
    }

    #[test]
    fn bare_name_with_tag() {
        let r = ImageRef::parse("redis:7-alpine").unwrap();
        assert_eq!(r, default_ref("library", "redis", "7-alpine"));
        assert_eq!(r.repository_path(), "library/redis");
    }

    #[test]
    fn namespaced_name() {
        let r = ImageRef::parse("grafana/grafana:10.4.1").unwrap();
        assert_eq!(r, default_ref("grafana", "grafana", "10.4.1"));
        assert_eq!(r.registry_host(), None);
        assert_eq!(r.to_string(), "grafana/grafana:10.4.1");
    }

    #[test]
    fn three_segments_are_host_qualified() {
        let r = ImageRef::parse("ghcr.io/home-assistant/home-assistant:stable").unwrap();
        assert_eq!(
            r,
            ImageRef::Hosted {
                host: "ghcr.io".into(),
                path: "home-assistant/home-assistant".into(),
                tag: "stable".into(),
            }
        );
        assert_eq!(r.registry_host(), Some("ghcr.io"));
    }

    #[test]
    fn three_segments_without_dot_are_still_host_qualified() {
        let r = ImageRef::parse("a/b/c").unwrap();
        assert_eq!(r.registry_host(), Some("a"));
        assert_eq!(r.repository_path(), "b/c");
        assert_eq!(r.tag(), "latest");
    }

    #[test]
    fn host_with_port_is_not_mistaken_for_tag() {
        let r = ImageRef::parse("localhost:5000/myapp").unwrap();
        assert_eq!(
            r,
            ImageRef::Hosted {
                host: "localhost:5000".into(),
                path: "myapp".into(),
                tag: "latest".into(),
            }
        );
        let r = ImageRef::parse("registry.local:5000/team/app:1.2").unwrap();
        assert_eq!(r.registry_host(), Some("registry.local:5000"));
        assert_eq!(r.repository_path(), "team/app");
        assert_eq!(r.tag(), "1.2");
    }

    #[test]
    fn two_segments_with_dotted_host() {
        let r = ImageRef::parse("quay.io/prometheus").unwrap();
        assert_eq!(r.registry_host(), Some("quay.io"));
    }

    #[test]
    fn rejects_malformed_references() {
        assert_eq!(ImageRef::parse(""), Err(ImageRefError::Empty));
        assert_eq!(ImageRef::parse("   "), Err(ImageRefError::Empty));
        assert!(matches!(
            ImageRef::parse("nginx:"),
            Err(ImageRefError::EmptySegment(_))
        ));
        assert!(matches!(
            ImageRef::parse("/nginx"),
            Err(ImageRefError::EmptySegment(_))
        ));
        assert!(matches!(
            ImageRef::parse("a//b"),
            Err(ImageRefError::EmptySegment(_))
        ));
    }

    #[test]
    fn digest_pin_carries_digest_and_inner_reference() {
        let r = ImageRef::parse("grafana/grafana:10.4@sha256:abcd").unwrap();
        assert_eq!(r.pinned_digest(), Some("sha256:abcd"));
        assert_eq!(r.repository_path(), "grafana/grafana");
        assert_eq!(r.tag(), "10.4");
        assert_eq!(r.registry_host(), None);
        assert_eq!(r.to_string(), "grafana/grafana:10.4@sha256:abcd");

        let r = ImageRef::parse("nginx@sha256:abcd").unwrap();
        assert_eq!(
            r,
            ImageRef::Pinned {
                reference: Box::new(default_ref("library", "nginx", "latest")),
                digest: "sha256:abcd".into(),
            }
        );
    }

    #[test]
    fn digest_pin_keeps_registry_host() {
        let r = ImageRef::parse("ghcr.io/owner/app@sha256:ff00").unwrap();
        assert_eq!(r.registry_host(), Some("ghcr.io"));
        assert_eq!(r.pinned_digest(), Some("sha256:ff00"));
    }

    #[test]
    fn rejects_malformed_digests_and_image_ids() {
        for bad in ["nginx@", "nginx@sha256:", "nginx@abcd", "nginx@sha256:a@b"] {
            assert!(
                matches!(ImageRef::parse(bad), Err(ImageRefError::InvalidDigest(_))),
                "{} should be rejected",
                bad
            );
        }
        assert!(matches!(
            ImageRef::parse("sha256:0123456789abcdef"),
            Err(ImageRefError::ImageId(_))
        ));
    }
}
