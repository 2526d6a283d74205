//! Resolver — Pass 2 (C6): builds the interface-to-implementation map and
//! resolves each component's injected dependencies to a concrete type.

use tracing::warn;

use crate::model::ParsedApplication;

/// Run Pass 2 over one application in place: populate `interface_to_impls`,
/// then resolve every `InjectedDependency` across every component.
pub fn resolve(app: &mut ParsedApplication) {
    build_interface_map(app);
    resolve_dependencies(app);
}

fn build_interface_map(app: &mut ParsedApplication) {
    // Walk `component_order` (classifier-insertion order), not
    // `component_index.values()` (HashMap iteration order is unspecified
    // and varies run to run), so the ambiguity tie-break in
    // `resolve_one` stays deterministic.
    let mut pairs: Vec<(String, String)> = Vec::new();
    for qualified in &app.component_order {
        let Some(component) = app.component_index.get(qualified) else { continue };
        for iface_name in &component.implemented_interfaces {
            pairs.push((iface_name.clone(), component.qualified_name.clone()));
        }
    }
    for (iface_name, class_name) in pairs {
        let entry = app.interface_to_impls.entry(iface_name).or_default();
        if !entry.contains(&class_name) {
            entry.push(class_name);
        }
    }
}

fn resolve_dependencies(app: &mut ParsedApplication) {
    let component_keys: Vec<String> = app
        .component_index
        .iter()
        .filter(|(key, component)| *key == &component.qualified_name)
        .map(|(key, _)| key.clone())
        .collect();

    for component_key in component_keys {
        let field_names: Vec<String> = app
            .component_index
            .get(&component_key)
            .map(|c| c.injected_dependencies.keys().cloned().collect())
            .unwrap_or_default();

        for field_name in field_names {
            let (declared_simple, declared_qualified) = {
                let dep = &app.component_index.get(&component_key).unwrap().injected_dependencies[&field_name];
                (dep.declared_type_simple.clone(), dep.declared_type_qualified.clone())
            };

            let resolution = resolve_one(app, &declared_qualified, &declared_simple, &component_key, &field_name);

            if let Some((resolved_simple, resolved_qualified)) = resolution {
                let component = app.component_index.get_mut(&component_key).unwrap();
                let dep = component.injected_dependencies.get_mut(&field_name).unwrap();
                dep.resolved_type_simple = Some(resolved_simple);
                dep.resolved_type_qualified = Some(resolved_qualified);
            }
        }
    }
}

fn resolve_one(
    app: &ParsedApplication,
    declared_qualified: &str,
    declared_simple: &str,
    owner_class: &str,
    field_name: &str,
) -> Option<(String, String)> {
    // 1. Direct component match (the declared type is itself a concrete component).
    if let Some(component) = app.component_index.get(declared_qualified) {
        return Some((component.class_name.clone(), component.qualified_name.clone()));
    }
    if let Some(component) = app.component_index.get(declared_simple) {
        return Some((component.class_name.clone(), component.qualified_name.clone()));
    }

    // 2. Interface -> impl map, qualified name first, then simple name.
    for key in [declared_qualified, declared_simple] {
        if let Some(impls) = app.interface_to_impls.get(key) {
            match impls.len() {
                0 => continue,
                1 => {
                    let qualified = impls[0].clone();
                    let simple = app
                        .component_index
                        .get(&qualified)
                        .map(|c| c.class_name.clone())
                        .unwrap_or_else(|| qualified.clone());
                    return Some((simple, qualified));
                }
                _ => {
                    warn!(
                        interface = key,
                        owner = owner_class,
                        field = field_name,
                        candidates = ?impls,
                        "ambiguous dependency injection, picking first by insertion order"
                    );
                    let qualified = impls[0].clone();
                    let simple = app
                        .component_index
                        .get(&qualified)
                        .map(|c| c.class_name.clone())
                        .unwrap_or_else(|| qualified.clone());
                    return Some((simple, qualified));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentType, InjectedDependency, InjectionType, ParsedComponent};
    use std::path::PathBuf;

    fn service(name: &str, pkg: &str, interfaces: &[&str]) -> ParsedComponent {
        let mut c = ParsedComponent::new(
            name,
            &format!("{}.{}", pkg, name),
            Some(pkg.to_string()),
            ComponentType::Service,
            1,
            10,
        );
        c.implemented_interfaces = interfaces.iter().map(|s| s.to_string()).collect();
        c
    }

    #[test]
    fn single_implementation_resolves_interface_injection() {
        let mut app = ParsedApplication::new_aggregate(PathBuf::from("/repo"));
        app.insert_component(service("PaymentServiceImpl", "a.b", &["IPaymentService", "a.b.IPaymentService"]));

        let mut order_service = ParsedComponent::new(
            "OrderService",
            "a.b.OrderService",
            Some("a.b".to_string()),
            ComponentType::Service,
            1,
            20,
        );
        order_service.injected_dependencies.insert(
            "paymentService".to_string(),
            InjectedDependency::new("paymentService", "IPaymentService", "a.b.IPaymentService", InjectionType::Constructor),
        );
        app.insert_component(order_service);

        resolve(&mut app);

        let resolved = &app.component_index["a.b.OrderService"].injected_dependencies["paymentService"];
        assert_eq!(resolved.resolved_type_qualified.as_deref(), Some("a.b.PaymentServiceImpl"));
    }

    #[test]
    fn unresolvable_dependency_is_left_unset_not_half_filled() {
        let mut app = ParsedApplication::new_aggregate(PathBuf::from("/repo"));
        let mut svc = ParsedComponent::new("OrderService", "a.b.OrderService", Some("a.b".into()), ComponentType::Service, 1, 20);
        svc.injected_dependencies.insert(
            "missing".to_string(),
            InjectedDependency::new("missing", "INotFound", "a.b.INotFound", InjectionType::FieldAutowired),
        );
        app.insert_component(svc);

        resolve(&mut app);

        let dep = &app.component_index["a.b.OrderService"].injected_dependencies["missing"];
        assert!(!dep.is_resolved());
        assert!(dep.resolved_type_simple.is_none());
        assert!(dep.resolved_type_qualified.is_none());
    }

    #[test]
    fn ambiguous_implementations_pick_first_insertion_order() {
        let mut app = ParsedApplication::new_aggregate(PathBuf::from("/repo"));
        app.insert_component(service("FirstImpl", "a.b", &["IThing"]));
        app.insert_component(service("SecondImpl", "a.b", &["IThing"]));
        let mut consumer = ParsedComponent::new("Consumer", "a.b.Consumer", Some("a.b".into()), ComponentType::Service, 1, 5);
        consumer.injected_dependencies.insert(
            "thing".to_string(),
            InjectedDependency::new("thing", "IThing", "IThing", InjectionType::FieldAutowired),
        );
        app.insert_component(consumer);

        resolve(&mut app);

        let dep = &app.component_index["a.b.Consumer"].injected_dependencies["thing"];
        assert_eq!(dep.resolved_type_qualified.as_deref(), Some("a.b.FirstImpl"));
    }
}
