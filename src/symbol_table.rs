use std::collections::HashMap;
use serde::{Serialize, Deserialize};

// ============================================================================
// ImportIndex - Per-file import resolution index
// ============================================================================

/// Import resolution index for a single Java file
///
/// Provides efficient FQN resolution from simple class names using the file's
/// import statements. Resolution follows Java's standard priority:
/// 1. Explicit imports (e.g., `import com.example.UserRepository`)
/// 2. Wildcard imports (e.g., `import com.example.*`)
/// 3. Same-package classes
/// 4. java.lang classes (implicitly imported)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportIndex {
    /// Explicit imports: simple name -> FQN
    /// e.g., "UserRepository" -> "com.example.repo.UserRepository"
    pub explicit: HashMap<String, String>,
    /// Wildcard import packages
    /// e.g., ["com.example.repo", "java.util"]
    pub wildcards: Vec<String>,
    /// Current file's package
    /// e.g., Some("com.example.service")
    pub package: Option<String>,
    /// Classes defined in this file (auto-imported within same package)
    /// e.g., ["UserService", "UserServiceImpl"]
    pub local_classes: Vec<String>,
}

impl ImportIndex {
    /// Build ImportIndex from parsed import statements and package declaration
    ///
    /// # Arguments
    /// * `imports` - List of import statements (e.g., "com.example.UserRepository", "java.util.*")
    /// * `package` - The package declaration of the current file
    ///
    /// # Returns
    /// A new ImportIndex with imports categorized as explicit or wildcard
    pub fn from_imports(imports: Vec<String>, package: Option<String>) -> Self {
        let mut explicit = HashMap::new();
        let mut wildcards = Vec::new();

        for import in imports {
            let import = import.trim();
            if import.ends_with(".*") {
                // Wildcard import: extract package name
                let pkg = import.trim_end_matches(".*");
                wildcards.push(pkg.to_string());
            } else if !import.is_empty() {
                // Explicit import: extract simple name as key
                if let Some(simple_name) = import.rsplit('.').next() {
                    explicit.insert(simple_name.to_string(), import.to_string());
                }
            }
        }

        Self {
            explicit,
            wildcards,
            package,
            local_classes: Vec::new(),
        }
    }

    /// Resolve a simple class name to its FQN
    ///
    /// Resolution priority:
    /// 1. Explicit imports (O(1) lookup)
    /// 2. Wildcard imports (check against known_classes)
    /// 3. Same-package classes
    /// 4. java.lang classes
    ///
    /// # Arguments
    /// * `simple_name` - The simple class name to resolve (e.g., "UserRepository")
    /// * `known_classes` - Map of FQN -> TypeInfo for all known classes in the project
    ///
    /// # Returns
    /// The resolved FQN, or None if unresolvable
    pub fn resolve(&self, simple_name: &str, known_classes: &HashMap<String, String>) -> Option<String> {
        // 1. Check explicit imports first (O(1))
        if let Some(fqn) = self.explicit.get(simple_name) {
            return Some(fqn.clone());
        }

        // 2. Check wildcard imports against known classes
        for wildcard_pkg in &self.wildcards {
            let candidate_fqn = format!("{}.{}", wildcard_pkg, simple_name);
            if known_classes.contains_key(&candidate_fqn) {
                return Some(candidate_fqn);
            }
        }

        // 3. Check same-package classes
        if let Some(ref pkg) = self.package {
            // Check local classes defined in this file
            if self.local_classes.contains(&simple_name.to_string()) {
                return Some(format!("{}.{}", pkg, simple_name));
            }
            // Check known classes in same package
            let same_pkg_fqn = format!("{}.{}", pkg, simple_name);
            if known_classes.contains_key(&same_pkg_fqn) {
                return Some(same_pkg_fqn);
            }
        }

        // 4. Check java.lang (implicitly imported)
        let java_lang_fqn = format!("java.lang.{}", simple_name);
        if is_java_lang_class(simple_name) || known_classes.contains_key(&java_lang_fqn) {
            return Some(java_lang_fqn);
        }

        None
    }

    /// Add a local class to the index
    pub fn add_local_class(&mut self, class_name: &str) {
        if !self.local_classes.contains(&class_name.to_string()) {
            self.local_classes.push(class_name.to_string());
        }
    }
}

/// Check if a class name is a common java.lang class
fn is_java_lang_class(name: &str) -> bool {
    matches!(
        name,
        "String" | "Object" | "Integer" | "Long" | "Double" | "Float"
        | "Boolean" | "Byte" | "Short" | "Character" | "Number"
        | "Class" | "System" | "Thread" | "Runnable" | "Exception"
        | "RuntimeException" | "Error" | "Throwable" | "StringBuilder"
        | "StringBuffer" | "Math" | "Comparable" | "Iterable" | "Enum"
        | "Override" | "Deprecated" | "SuppressWarnings" | "FunctionalInterface"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_import_index_from_imports_explicit() {
        let imports = vec![
            "com.example.repo.UserRepository".to_string(),
            "java.util.List".to_string(),
        ];
        let index = ImportIndex::from_imports(imports, Some("com.example.service".to_string()));

        assert_eq!(index.explicit.len(), 2);
        assert_eq!(
            index.explicit.get("UserRepository"),
            Some(&"com.example.repo.UserRepository".to_string())
        );
        assert_eq!(
            index.explicit.get("List"),
            Some(&"java.util.List".to_string())
        );
        assert!(index.wildcards.is_empty());
    }

    #[test]
    fn test_import_index_from_imports_wildcard() {
        let imports = vec![
            "com.example.repo.*".to_string(),
            "java.util.*".to_string(),
        ];
        let index = ImportIndex::from_imports(imports, None);

        assert!(index.explicit.is_empty());
        assert_eq!(index.wildcards.len(), 2);
        assert!(index.wildcards.contains(&"com.example.repo".to_string()));
        assert!(index.wildcards.contains(&"java.util".to_string()));
    }

    #[test]
    fn test_import_index_from_imports_mixed() {
        let imports = vec![
            "com.example.repo.UserRepository".to_string(),
            "java.util.*".to_string(),
            "com.example.service.OrderService".to_string(),
        ];
        let index = ImportIndex::from_imports(imports, Some("com.example.controller".to_string()));

        assert_eq!(index.explicit.len(), 2);
        assert_eq!(index.wildcards.len(), 1);
        assert_eq!(index.package, Some("com.example.controller".to_string()));
    }

    #[test]
    fn test_import_index_resolve_explicit() {
        let imports = vec!["com.example.repo.UserRepository".to_string()];
        let index = ImportIndex::from_imports(imports, None);
        let known_classes = HashMap::new();

        let resolved = index.resolve("UserRepository", &known_classes);
        assert_eq!(resolved, Some("com.example.repo.UserRepository".to_string()));
    }

    #[test]
    fn test_import_index_resolve_wildcard() {
        let imports = vec!["com.example.repo.*".to_string()];
        let index = ImportIndex::from_imports(imports, None);
        let mut known_classes = HashMap::new();
        known_classes.insert(
            "com.example.repo.UserRepository".to_string(),
            "UserRepository".to_string(),
        );

        let resolved = index.resolve("UserRepository", &known_classes);
        assert_eq!(resolved, Some("com.example.repo.UserRepository".to_string()));
    }

    #[test]
    fn test_import_index_resolve_same_package() {
        let index = ImportIndex::from_imports(vec![], Some("com.example.service".to_string()));
        let mut known_classes = HashMap::new();
        known_classes.insert(
            "com.example.service.UserService".to_string(),
            "UserService".to_string(),
        );

        let resolved = index.resolve("UserService", &known_classes);
        assert_eq!(resolved, Some("com.example.service.UserService".to_string()));
    }

    #[test]
    fn test_import_index_resolve_java_lang() {
        let index = ImportIndex::from_imports(vec![], None);
        let known_classes = HashMap::new();

        let resolved = index.resolve("String", &known_classes);
        assert_eq!(resolved, Some("java.lang.String".to_string()));

        let resolved = index.resolve("Integer", &known_classes);
        assert_eq!(resolved, Some("java.lang.Integer".to_string()));
    }

    #[test]
    fn test_import_index_resolve_priority() {
        // Explicit import should take priority over wildcard
        let imports = vec![
            "com.other.UserRepository".to_string(),  // explicit
            "com.example.repo.*".to_string(),        // wildcard
        ];
        let index = ImportIndex::from_imports(imports, None);
        let mut known_classes = HashMap::new();
        known_classes.insert(
            "com.example.repo.UserRepository".to_string(),
            "UserRepository".to_string(),
        );

        let resolved = index.resolve("UserRepository", &known_classes);
        // Should resolve to explicit import, not wildcard
        assert_eq!(resolved, Some("com.other.UserRepository".to_string()));
    }

    #[test]
    fn test_import_index_add_local_class() {
        let mut index = ImportIndex::from_imports(vec![], Some("com.example.service".to_string()));
        index.add_local_class("UserService");
        index.add_local_class("UserServiceImpl");
        index.add_local_class("UserService"); // duplicate

        assert_eq!(index.local_classes.len(), 2);
        assert!(index.local_classes.contains(&"UserService".to_string()));
        assert!(index.local_classes.contains(&"UserServiceImpl".to_string()));
    }

    #[test]
    fn test_import_index_resolve_local_class() {
        let mut index = ImportIndex::from_imports(vec![], Some("com.example.service".to_string()));
        index.add_local_class("UserService");
        let known_classes = HashMap::new();

        let resolved = index.resolve("UserService", &known_classes);
        assert_eq!(resolved, Some("com.example.service.UserService".to_string()));
    }

    /// Strategy to generate valid Java package names
    fn java_package_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z0-9]{0,7}", 1..=4)
            .prop_map(|parts| parts.join("."))
    }

    /// Strategy to generate valid Java class names (PascalCase)
    fn java_class_name_strategy() -> impl Strategy<Value = String> {
        "[A-Z][a-zA-Z0-9]{0,15}".prop_filter("Must be valid class name", |s| {
            !s.is_empty() && s.chars().next().unwrap().is_uppercase()
        })
    }

    /// Strategy to generate explicit import statements
    fn explicit_import_strategy() -> impl Strategy<Value = String> {
        (java_package_strategy(), java_class_name_strategy())
            .prop_map(|(pkg, class)| format!("{}.{}", pkg, class))
    }

    /// Strategy to generate wildcard import statements
    fn wildcard_import_strategy() -> impl Strategy<Value = String> {
        java_package_strategy().prop_map(|pkg| format!("{}.*", pkg))
    }

    /// Strategy to generate a mix of explicit and wildcard imports
    fn mixed_imports_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop_oneof![
                explicit_import_strategy(),
                wildcard_import_strategy(),
            ],
            0..=10
        )
    }

    proptest! {
        #[test]
        fn prop_import_extraction_completeness(
            imports in mixed_imports_strategy(),
            package in prop::option::of(java_package_strategy())
        ) {
            let index = ImportIndex::from_imports(imports.clone(), package);

            let expected_explicit: Vec<_> = imports.iter()
                .filter(|i| !i.ends_with(".*") && !i.is_empty())
                .collect();
            let expected_wildcards: Vec<_> = imports.iter()
                .filter(|i| i.ends_with(".*"))
                .collect();

            prop_assert!(
                index.explicit.len() <= expected_explicit.len(),
                "Explicit imports should not exceed input count"
            );
            prop_assert_eq!(
                index.wildcards.len(),
                expected_wildcards.len(),
                "Wildcard count should match exactly"
            );

            for (simple_name, fqn) in &index.explicit {
                prop_assert!(
                    fqn.ends_with(simple_name),
                    "FQN '{}' should end with simple name '{}'",
                    fqn, simple_name
                );
                prop_assert!(
                    fqn.contains('.'),
                    "FQN '{}' should contain package separator",
                    fqn
                );
            }

            for wildcard in &index.wildcards {
                prop_assert!(
                    !wildcard.ends_with(".*"),
                    "Wildcard '{}' should not contain .* suffix",
                    wildcard
                );
                prop_assert!(
                    !wildcard.is_empty(),
                    "Wildcard package should not be empty"
                );
            }
        }

        #[test]
        fn prop_fqn_resolution_priority(
            class_name in java_class_name_strategy(),
            explicit_pkg in java_package_strategy(),
            wildcard_pkg in java_package_strategy(),
            same_pkg in java_package_strategy(),
        ) {
            let explicit_fqn = format!("{}.{}", explicit_pkg, class_name);
            let wildcard_fqn = format!("{}.{}", wildcard_pkg, class_name);
            let same_pkg_fqn = format!("{}.{}", same_pkg, class_name);

            let imports = vec![
                explicit_fqn.clone(),
                format!("{}.*", wildcard_pkg),
            ];
            let index = ImportIndex::from_imports(imports, Some(same_pkg.clone()));

            let mut known_classes = HashMap::new();
            known_classes.insert(wildcard_fqn.clone(), class_name.clone());
            known_classes.insert(same_pkg_fqn.clone(), class_name.clone());

            let resolved = index.resolve(&class_name, &known_classes);
            prop_assert_eq!(
                resolved.as_ref(),
                Some(&explicit_fqn),
                "Explicit import should take priority. Got {:?}, expected {:?}",
                resolved, explicit_fqn
            );

            let imports_no_explicit = vec![format!("{}.*", wildcard_pkg)];
            let index_no_explicit = ImportIndex::from_imports(imports_no_explicit, Some(same_pkg.clone()));
            let resolved_no_explicit = index_no_explicit.resolve(&class_name, &known_classes);
            prop_assert_eq!(
                resolved_no_explicit.as_ref(),
                Some(&wildcard_fqn),
                "Wildcard import should take priority over same-package. Got {:?}, expected {:?}",
                resolved_no_explicit, wildcard_fqn
            );

            let index_same_pkg_only = ImportIndex::from_imports(vec![], Some(same_pkg.clone()));
            let resolved_same_pkg = index_same_pkg_only.resolve(&class_name, &known_classes);
            prop_assert_eq!(
                resolved_same_pkg.as_ref(),
                Some(&same_pkg_fqn),
                "Same-package should be used when no imports match. Got {:?}, expected {:?}",
                resolved_same_pkg, same_pkg_fqn
            );
        }

        #[test]
        fn prop_java_lang_fallback(
            other_pkg in java_package_strategy(),
        ) {
            let java_lang_classes = vec!["String", "Integer", "Long", "Object", "Exception"];

            for class_name in java_lang_classes {
                let index = ImportIndex::from_imports(vec![], Some(other_pkg.clone()));
                let known_classes = HashMap::new();

                let resolved = index.resolve(class_name, &known_classes);
                let expected = format!("java.lang.{}", class_name);

                prop_assert_eq!(
                    resolved.as_ref(),
                    Some(&expected),
                    "java.lang.{} should be resolved as fallback. Got {:?}",
                    class_name, resolved
                );
            }
        }
    }
}
