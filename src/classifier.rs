//! Component Classifier (C4): assigns each parsed type a [`ComponentType`]
//! using the annotation/method evidence gathered during AST extraction.

use crate::model::ComponentType;

/// Evidence gathered about one type during structural AST extraction, enough
/// to apply the classification precedence rules without re-walking the tree.
#[derive(Debug, Clone, Default)]
pub struct ClassificationInput<'a> {
    pub class_level_annotations: &'a [String],
    pub is_interface: bool,
    pub extended_interface_names: &'a [String],
    pub has_kafka_listener_method: bool,
}

/// Classification precedence (first match wins):
/// 1. class-level stereotype annotation
/// 2. `@Component` + a Kafka-listener method ⇒ KafkaListener
/// 3. interface extending a `*Repository`-named supertype ⇒ Repository
/// 4. any class with a Kafka-listener method ⇒ KafkaListener
/// 5. otherwise Unknown
pub fn classify(input: &ClassificationInput) -> ComponentType {
    for annotation in input.class_level_annotations {
        let by_annotation = ComponentType::from_annotation(annotation);
        if by_annotation != ComponentType::Unknown {
            if by_annotation == ComponentType::Component && input.has_kafka_listener_method {
                return ComponentType::KafkaListener;
            }
            return by_annotation;
        }
    }

    if input.is_interface
        && input
            .extended_interface_names
            .iter()
            .any(|name| name.ends_with("Repository"))
    {
        return ComponentType::Repository;
    }

    if input.has_kafka_listener_method {
        return ComponentType::KafkaListener;
    }

    ComponentType::Unknown
}

/// Package filter for Spring-Boot mode: only types whose package starts with
/// the application's base package are classified. Non-Spring mode (no base
/// package supplied) classifies everything.
pub fn is_in_scope(type_package: Option<&str>, base_package: Option<&str>) -> bool {
    match base_package {
        None => true,
        Some(base) => type_package.map(|pkg| pkg.starts_with(base)).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with_annotations(annotations: &[&str]) -> ClassificationInput<'static> {
        let leaked: &'static [String] = Box::leak(
            annotations.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_boxed_slice(),
        );
        ClassificationInput {
            class_level_annotations: leaked,
            is_interface: false,
            extended_interface_names: &[],
            has_kafka_listener_method: false,
        }
    }

    #[test]
    fn class_annotation_wins_first() {
        let input = input_with_annotations(&["RestController"]);
        assert_eq!(classify(&input), ComponentType::RestController);
    }

    #[test]
    fn component_with_kafka_listener_method_becomes_kafka_listener() {
        let mut input = input_with_annotations(&["Component"]);
        input.has_kafka_listener_method = true;
        assert_eq!(classify(&input), ComponentType::KafkaListener);
    }

    #[test]
    fn repository_named_supertype_interface_classifies_as_repository() {
        let leaked: &'static [String] =
            Box::leak(vec!["UserRepository".to_string()].into_boxed_slice());
        let input = ClassificationInput {
            class_level_annotations: &[],
            is_interface: true,
            extended_interface_names: leaked,
            has_kafka_listener_method: false,
        };
        assert_eq!(classify(&input), ComponentType::Repository);
    }

    #[test]
    fn plain_class_with_kafka_listener_method_and_no_annotation() {
        let mut input = ClassificationInput::default();
        input.has_kafka_listener_method = true;
        assert_eq!(classify(&input), ComponentType::KafkaListener);
    }

    #[test]
    fn unknown_when_nothing_matches() {
        let input = ClassificationInput::default();
        assert_eq!(classify(&input), ComponentType::Unknown);
    }

    #[test]
    fn package_filter_respects_base_package_prefix() {
        assert!(is_in_scope(Some("com.example.service"), Some("com.example")));
        assert!(!is_in_scope(Some("com.other.service"), Some("com.example")));
        assert!(is_in_scope(Some("anything"), None));
    }
}
