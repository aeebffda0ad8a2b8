//! Human-readable views of a single service.

use crate::compose::ServiceDescriptor;

const NOT_AVAILABLE: &str = "N/A";

/// One-screen summary, one `Field: value` line per attribute.
pub fn summary_lines(service: &ServiceDescriptor) -> Vec<String> {
    let environment = service.environment.as_ref().map(|env| {
        env.iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    });

    vec![
        service.name.clone(),
        format!("Image: {}", service.image.as_deref().unwrap_or(NOT_AVAILABLE)),
        format!("Ports: {}", join_or_na(service.ports.as_deref())),
        format!(
            "Environment: {}",
            environment.as_deref().unwrap_or(NOT_AVAILABLE)
        ),
        format!("Volumes: {}", join_or_na(service.volumes.as_deref())),
        format!("Depends On: {}", join_or_na(service.depends_on.as_deref())),
    ]
}

fn join_or_na(items: Option<&[String]>) -> String {
    items.map_or_else(|| NOT_AVAILABLE.to_string(), |items| items.join(", "))
}

/// A titled list in the detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: &'static str,
    pub items: Vec<String>,
}

/// Panel contents: the image line always, then only the sections the service
/// actually declares.
pub fn panel_sections(service: &ServiceDescriptor) -> Vec<Section> {
    let mut sections = vec![Section {
        heading: "Image",
        items: vec![service.image.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())],
    }];

    if let Some(ports) = &service.ports {
        sections.push(Section {
            heading: "Ports",
            items: ports.clone(),
        });
    }
    if let Some(env) = &service.environment {
        sections.push(Section {
            heading: "Environment Variables",
            items: env.iter().map(|(k, v)| format!("{k}: {v}")).collect(),
        });
    }
    if let Some(volumes) = &service.volumes {
        sections.push(Section {
            heading: "Volumes",
            items: volumes.clone(),
        });
    }
    if let Some(deps) = &service.depends_on {
        sections.push(Section {
            heading: "Depends On",
            items: deps.clone(),
        });
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn sample() -> ServiceDescriptor {
        let mut env = IndexMap::new();
        env.insert("POSTGRES_DB".to_string(), "app".to_string());
        env.insert("POSTGRES_USER".to_string(), "admin".to_string());
        ServiceDescriptor {
            name: "db-main".to_string(),
            image: Some("postgres:16".to_string()),
            ports: Some(vec!["5432:5432".to_string()]),
            environment: Some(env),
            volumes: None,
            depends_on: None,
        }
    }

    #[test]
    fn summary_marks_absent_fields() {
        assert_eq!(
            summary_lines(&sample()),
            vec![
                "db-main",
                "Image: postgres:16",
                "Ports: 5432:5432",
                "Environment: POSTGRES_DB=app, POSTGRES_USER=admin",
                "Volumes: N/A",
                "Depends On: N/A",
            ]
        );
    }

    #[test]
    fn panel_lists_only_declared_sections() {
        let sections = panel_sections(&sample());
        let headings: Vec<_> = sections.iter().map(|s| s.heading).collect();
        assert_eq!(headings, vec!["Image", "Ports", "Environment Variables"]);
        assert_eq!(sections[2].items, vec!["POSTGRES_DB: app", "POSTGRES_USER: admin"]);
    }

    #[test]
    fn panel_always_has_an_image_line() {
        let sections = panel_sections(&ServiceDescriptor::new("bare"));
        assert_eq!(
            sections,
            vec![Section {
                heading: "Image",
                items: vec!["N/A".to_string()],
            }]
        );
    }
}
