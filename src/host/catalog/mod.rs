//! The framework catalog.
//!
//! Declaration stubs, written in the supported C# subset, for the parts of the base class
//! library and of NUnit that the analyzers reason about. The stubs are parsed and declared
//! once per process; every [`Compilation`](crate::host::semantic::Compilation) starts from a
//! copy of the resulting registry and adds its own user types on top.
//!
//! The assertion classes are assembled from shared member blocks: `Assert` carries both the
//! constraint model and the classic model (NUnit 3), `ClassicAssert` carries the classic model
//! under `NUnit.Framework.Legacy` (NUnit 4), and `StringAssert`/`CollectionAssert` exist under
//! both namespaces.

use std::sync::OnceLock;

use crate::{
    host::{
        semantic::declare::{declare_types, resolve_bases, resolve_members},
        syntax::SyntaxTree,
        types::TypeRegistry,
    },
    Result,
};

const SYSTEM: &str = include_str!("system.cs");
const COLLECTIONS: &str = include_str!("collections.cs");
const IO: &str = include_str!("io.cs");
const TASKS: &str = include_str!("tasks.cs");
const NUNIT: &str = include_str!("nunit.cs");
const ASSERT: &str = include_str!("assert.cs");
const CLASSIC: &str = include_str!("classic.cs");
const STRING_ASSERT: &str = include_str!("string_assert.cs");
const COLLECTION_ASSERT: &str = include_str!("collection_assert.cs");

const ASSERT_USINGS: &str = "using System;
using System.Collections;
using System.Collections.Generic;
using System.Threading.Tasks;
using NUnit.Framework;
using NUnit.Framework.Constraints;
";

static REGISTRY: OnceLock<std::result::Result<TypeRegistry, String>> = OnceLock::new();

/// Wrap a member block into a static class declaration
fn wrap(namespace: &str, class: &str, blocks: &[&str]) -> String {
    let mut out = String::from(ASSERT_USINGS);
    out.push_str("\nnamespace ");
    out.push_str(namespace);
    out.push_str("\n{\n    public abstract class ");
    out.push_str(class);
    out.push_str("\n    {\n");
    for block in blocks {
        out.push_str(block);
        out.push('\n');
    }
    out.push_str("    }\n}\n");
    out
}

/// The catalog sources as `(path, text)` pairs
#[must_use]
pub fn sources() -> Vec<(&'static str, String)> {
    vec![
        ("catalog/system.cs", SYSTEM.to_string()),
        ("catalog/collections.cs", COLLECTIONS.to_string()),
        ("catalog/io.cs", IO.to_string()),
        ("catalog/tasks.cs", TASKS.to_string()),
        ("catalog/nunit.cs", NUNIT.to_string()),
        (
            "catalog/Assert.cs",
            wrap("NUnit.Framework", "Assert", &[ASSERT, CLASSIC]),
        ),
        (
            "catalog/ClassicAssert.cs",
            wrap("NUnit.Framework.Legacy", "ClassicAssert", &[CLASSIC]),
        ),
        (
            "catalog/StringAssert.cs",
            wrap("NUnit.Framework", "StringAssert", &[STRING_ASSERT]),
        ),
        (
            "catalog/CollectionAssert.cs",
            wrap("NUnit.Framework", "CollectionAssert", &[COLLECTION_ASSERT]),
        ),
        (
            "catalog/Legacy/StringAssert.cs",
            wrap("NUnit.Framework.Legacy", "StringAssert", &[STRING_ASSERT]),
        ),
        (
            "catalog/Legacy/CollectionAssert.cs",
            wrap("NUnit.Framework.Legacy", "CollectionAssert", &[COLLECTION_ASSERT]),
        ),
    ]
}

fn build() -> std::result::Result<TypeRegistry, String> {
    let trees = sources()
        .into_iter()
        .map(|(path, text)| SyntaxTree::parse(path, text))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| e.to_string())?;

    let mut registry = TypeRegistry::new();
    let declared = declare_types(&mut registry, &trees, true);
    resolve_bases(&mut registry, &declared);
    resolve_members(&mut registry, &trees, &declared);
    log::debug!("catalog declared {} types", registry.len());
    Ok(registry)
}

/// A copy of the declared catalog registry
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the built-in stubs fail to parse.
pub fn registry() -> Result<TypeRegistry> {
    match REGISTRY.get_or_init(build) {
        Ok(registry) => Ok(registry.clone()),
        Err(message) => Err(malformed_error!("catalog failed to parse - {}", message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::types::{MemberKind, WellKnown};

    #[test]
    fn test_catalog_parses() {
        let registry = registry().unwrap();
        for which in [
            WellKnown::Object,
            WellKnown::String,
            WellKnown::Nullable,
            WellKnown::IDisposable,
            WellKnown::IEnumerableOfT,
            WellKnown::Stream,
            WellKnown::TaskOfT,
            WellKnown::KeyValuePair,
        ] {
            assert!(registry.well_known(which).is_some(), "{:?}", which);
        }
    }

    #[test]
    fn test_assertion_classes_in_both_namespaces() {
        let registry = registry().unwrap();
        for name in [
            "NUnit.Framework.Assert",
            "NUnit.Framework.Legacy.ClassicAssert",
            "NUnit.Framework.StringAssert",
            "NUnit.Framework.Legacy.StringAssert",
            "NUnit.Framework.CollectionAssert",
            "NUnit.Framework.Legacy.CollectionAssert",
        ] {
            assert!(registry.lookup(name).is_some(), "{}", name);
        }
        let assert = registry
            .lookup("NUnit.Framework.Assert")
            .map(crate::host::types::Ty::named)
            .unwrap();
        let that = registry.members_named(&assert, "That");
        assert!(that.len() > 5);
        assert!(that
            .iter()
            .all(|m| registry.member(m).kind == MemberKind::Method));
    }

    #[test]
    fn test_constraint_hierarchy() {
        let registry = registry().unwrap();
        let equal = registry
            .lookup("NUnit.Framework.Constraints.EqualConstraint")
            .map(crate::host::types::Ty::named)
            .unwrap();
        assert!(registry.is_subtype_of_name(&equal, "NUnit.Framework.Constraints.Constraint"));
        let stream = registry.well_known_ty(WellKnown::Stream);
        assert!(registry.is_subtype_of_name(&stream, "System.IDisposable"));
    }
}
