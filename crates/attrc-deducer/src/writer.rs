//! Deducer output writer - the nine newline-delimited,
//! space-separated text artifacts.
//!
//! Each artifact is modeled as a row type with an `encode()` matching its
//! exact record format; [`DeducerWriter`] sorts rows and writes one file
//! per artifact. Sorting guarantees byte-identical output across runs over
//! identical input.

use anyhow::{Context, Result};
use std::path::Path;

fn join_sorted<I: IntoIterator<Item = String>>(items: I) -> String {
    let mut v: Vec<String> = items.into_iter().collect();
    v.sort();
    v.join(" ")
}

/// `mutations` - `qualified_name <class|function|var>`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MutationRow {
    pub qualified_name: String,
    pub original_kind: String,
}

impl MutationRow {
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{} {}", self.qualified_name, self.original_kind)
    }
}

/// `types` - `encode(location) (constrained|deduced) <class|instance|module|> sorted_general_types n_specific`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TypeRow {
    pub location: String,
    pub constrained: bool,
    pub kind: String,
    pub general_types: Vec<String>,
    pub n_specific: usize,
}

impl TypeRow {
    #[must_use]
    pub fn encode(&self) -> String {
        let status = if self.constrained { "constrained" } else { "deduced" };
        format!(
            "{} {status} {} {} {}",
            self.location,
            self.kind,
            join_sorted(self.general_types.iter().cloned()),
            self.n_specific
        )
    }
}

/// `type_summary` - `encode(location) (constrained|deduced) (specific|common|unguarded)[-kind|-object] sorted_general_types n_specific`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TypeSummaryRow {
    pub location: String,
    pub constrained: bool,
    pub guard: String,
    pub general_types: Vec<String>,
    pub n_specific: usize,
}

impl TypeSummaryRow {
    #[must_use]
    pub fn encode(&self) -> String {
        let status = if self.constrained { "constrained" } else { "deduced" };
        format!(
            "{} {status} {} {} {}",
            self.location,
            self.guard,
            join_sorted(self.general_types.iter().cloned()),
            self.n_specific
        )
    }
}

/// `type_warnings` - `encode(location) attr1; attr2; …`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TypeWarningRow {
    pub location: String,
    pub attrs: Vec<String>,
}

impl TypeWarningRow {
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{} {}", self.location, self.attrs.join("; "))
    }
}

/// `guards` - `encode(location) guard_test kind sorted_types`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GuardRow {
    pub location: String,
    pub guard_test: String,
    pub kind: String,
    pub types: Vec<String>,
}

impl GuardRow {
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{} {} {} {}", self.location, self.guard_test, self.kind, join_sorted(self.types.iter().cloned()))
    }
}

/// `attributes` - `encode(access_location) (constrained|deduced) <class|instance|module> sorted_refs`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttributeRow {
    pub access_location: String,
    pub constrained: bool,
    pub plane: String,
    pub refs: Vec<String>,
}

impl AttributeRow {
    #[must_use]
    pub fn encode(&self) -> String {
        let status = if self.constrained { "constrained" } else { "deduced" };
        format!("{} {status} {} {}", self.access_location, self.plane, join_sorted(self.refs.iter().cloned()))
    }
}

/// `attribute_summary` - `encode(access_location) (constrained|deduced) test_type_or_"untested" sorted_attrs`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttributeSummaryRow {
    pub access_location: String,
    pub constrained: bool,
    pub test_type: Option<String>,
    pub attrs: Vec<String>,
}

impl AttributeSummaryRow {
    #[must_use]
    pub fn encode(&self) -> String {
        let status = if self.constrained { "constrained" } else { "deduced" };
        let test = self.test_type.as_deref().unwrap_or("untested");
        format!("{} {status} {test} {}", self.access_location, join_sorted(self.attrs.iter().cloned()))
    }
}

/// `tests` - `encode(access_location) validate` or
/// `encode(access_location) test_type sorted_attrs accessor_type`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TestRow {
    Validate { access_location: String },
    Typed { access_location: String, test_type: String, attrs: Vec<String>, accessor_type: String },
}

impl TestRow {
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Validate { access_location } => format!("{access_location} validate"),
            Self::Typed { access_location, test_type, attrs, accessor_type } => {
                format!("{access_location} {test_type} {} {accessor_type}", join_sorted(attrs.iter().cloned()))
            }
        }
    }

    fn sort_key(&self) -> &str {
        match self {
            Self::Validate { access_location } | Self::Typed { access_location, .. } => access_location,
        }
    }
}

/// `attribute_warnings` - `encode(access_location)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttributeWarningRow {
    pub access_location: String,
}

impl AttributeWarningRow {
    #[must_use]
    pub fn encode(&self) -> String {
        self.access_location.clone()
    }
}

/// All nine artifacts, collected by the pipeline and handed to
/// [`DeducerWriter::write_all`].
#[derive(Clone, Debug, Default)]
pub struct DeducerArtifacts {
    pub mutations: Vec<MutationRow>,
    pub types: Vec<TypeRow>,
    pub type_summary: Vec<TypeSummaryRow>,
    pub type_warnings: Vec<TypeWarningRow>,
    pub guards: Vec<GuardRow>,
    pub attributes: Vec<AttributeRow>,
    pub attribute_summary: Vec<AttributeSummaryRow>,
    pub tests: Vec<TestRow>,
    pub attribute_warnings: Vec<AttributeWarningRow>,
}

#[derive(Default)]
pub struct DeducerWriter;

impl DeducerWriter {
    /// Write every artifact to `<output_dir>/<name>`, sorted for
    /// reproducibility. Fatal I/O errors propagate;
    /// the caller is responsible for surfacing them as a failed run.
    pub fn write_all(output_dir: &Path, artifacts: &DeducerArtifacts) -> Result<()> {
        std::fs::create_dir_all(output_dir).with_context(|| format!("creating output directory {}", output_dir.display()))?;

        let mut mutations = artifacts.mutations.clone();
        mutations.sort();
        Self::write_file(output_dir, "mutations", mutations.iter().map(MutationRow::encode))?;

        let mut types = artifacts.types.clone();
        types.sort();
        Self::write_file(output_dir, "types", types.iter().map(TypeRow::encode))?;

        let mut type_summary = artifacts.type_summary.clone();
        type_summary.sort();
        Self::write_file(output_dir, "type_summary", type_summary.iter().map(TypeSummaryRow::encode))?;

        let mut type_warnings = artifacts.type_warnings.clone();
        type_warnings.sort();
        Self::write_file(output_dir, "type_warnings", type_warnings.iter().map(TypeWarningRow::encode))?;

        let mut guards = artifacts.guards.clone();
        guards.sort();
        Self::write_file(output_dir, "guards", guards.iter().map(GuardRow::encode))?;

        let mut attributes = artifacts.attributes.clone();
        attributes.sort();
        Self::write_file(output_dir, "attributes", attributes.iter().map(AttributeRow::encode))?;

        let mut attribute_summary = artifacts.attribute_summary.clone();
        attribute_summary.sort();
        Self::write_file(output_dir, "attribute_summary", attribute_summary.iter().map(AttributeSummaryRow::encode))?;

        let mut tests = artifacts.tests.clone();
        tests.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        Self::write_file(output_dir, "tests", tests.iter().map(TestRow::encode))?;

        let mut attribute_warnings = artifacts.attribute_warnings.clone();
        attribute_warnings.sort();
        Self::write_file(output_dir, "attribute_warnings", attribute_warnings.iter().map(AttributeWarningRow::encode))?;

        Ok(())
    }

    fn write_file(output_dir: &Path, name: &str, lines: impl Iterator<Item = String>) -> Result<()> {
        let path = output_dir.join(name);
        let mut contents: String = lines.collect::<Vec<_>>().join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        std::fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_row_encodes_name_then_kind() {
        let row = MutationRow {
            qualified_name: "A.f".to_string(),
            original_kind: "function".to_string(),
        };
        assert_eq!(row.encode(), "A.f function");
    }

    #[test]
    fn attribute_summary_row_defaults_to_untested() {
        let row = AttributeSummaryRow {
            access_location: "m.f g:0".to_string(),
            constrained: false,
            test_type: None,
            attrs: vec!["g".to_string()],
        };
        assert_eq!(row.encode(), "m.f g:0 deduced untested g");
    }

    #[test]
    fn test_row_validate_has_two_fields() {
        let row = TestRow::Validate { access_location: "m.f g:0".to_string() };
        assert_eq!(row.encode(), "m.f g:0 validate");
    }

    #[test]
    fn test_row_typed_appends_accessor_type() {
        let row = TestRow::Typed {
            access_location: "m.f g:0".to_string(),
            test_type: "specific-class".to_string(),
            attrs: vec!["g".to_string(), "h".to_string()],
            accessor_type: "m.K".to_string(),
        };
        assert_eq!(row.encode(), "m.f g:0 specific-class g h m.K");
    }

    #[test]
    fn write_all_creates_every_artifact_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = DeducerArtifacts {
            mutations: vec![MutationRow {
                qualified_name: "A.f".to_string(),
                original_kind: "function".to_string(),
            }],
            ..Default::default()
        };
        DeducerWriter::write_all(dir.path(), &artifacts).unwrap();
        let names = [
            "mutations",
            "types",
            "type_summary",
            "type_warnings",
            "guards",
            "attributes",
            "attribute_summary",
            "tests",
            "attribute_warnings",
        ];
        for name in names {
            assert!(dir.path().join(name).exists());
        }
        let mutations = std::fs::read_to_string(dir.path().join("mutations")).unwrap();
        assert_eq!(mutations, "A.f function\n");
    }
}
