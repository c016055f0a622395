//! Descriptor Table Validation
//!
//! Runs once per extraction before any segmenting or execution. Configuration
//! problems are reported before schema problems.

use crate::error::{ConfigError, SchemaError};
use crate::{ExtractionConfig, FeatureDescriptor, Result};
use std::collections::HashMap;
use time_sequence::SequenceSet;
use windowing::WindowError;

/// Check the descriptors against each other, the run settings and the inputs
pub fn validate(
    descriptors: &[FeatureDescriptor],
    sequences: &SequenceSet,
    config: &ExtractionConfig,
) -> Result<()> {
    config.validate()?;

    let mut seen: HashMap<String, usize> = HashMap::new();
    for (position, descriptor) in descriptors.iter().enumerate() {
        check_descriptor(position, descriptor, sequences)?;

        for name in descriptor.output_names() {
            if let Some(&first) = seen.get(&name) {
                return Err(ConfigError::DuplicateOutput {
                    name,
                    first,
                    second: position,
                }
                .into());
            }
            seen.insert(name, position);
        }
    }

    check_axes(descriptors, sequences)?;
    Ok(())
}

fn check_descriptor(
    position: usize,
    descriptor: &FeatureDescriptor,
    sequences: &SequenceSet,
) -> std::result::Result<(), ConfigError> {
    let inputs = descriptor.inputs();
    if inputs.is_empty() {
        return Err(ConfigError::EmptyInputs {
            descriptor: position,
        });
    }

    descriptor
        .window()
        .validate()
        .map_err(|e| ConfigError::window(position, e))?;

    let function = descriptor.function();
    if let Some(expected) = function.input_arity() {
        if expected != inputs.len() {
            return Err(ConfigError::InputArity {
                descriptor: position,
                expected,
                actual: inputs.len(),
            });
        }
    }

    if let Some(names) = descriptor.output_override() {
        let expected = function.outputs().len();
        if names.len() != expected {
            return Err(ConfigError::OutputArity {
                descriptor: position,
                expected,
                actual: names.len(),
            });
        }
    }

    if let Some(column) = inputs.iter().find(|column| !sequences.contains(column)) {
        return Err(ConfigError::UnknownColumn {
            descriptor: position,
            column: column.clone(),
        });
    }

    if descriptor.primary_position().is_none() {
        return Err(ConfigError::UnknownPrimary {
            descriptor: position,
            column: descriptor.primary().unwrap_or_default().to_string(),
        });
    }

    Ok(())
}

/// Every descriptor's inputs share its primary's index kind, the window can be
/// measured on it, and all primaries share one kind
fn check_axes(
    descriptors: &[FeatureDescriptor],
    sequences: &SequenceSet,
) -> std::result::Result<(), SchemaError> {
    let mut axis: Option<(&str, time_sequence::IndexKind)> = None;

    for (position, descriptor) in descriptors.iter().enumerate() {
        let inputs = descriptor.inputs();
        let primary_name = &inputs[descriptor.primary_position().unwrap_or(0)];
        let Some(primary) = sequences.get(primary_name) else {
            continue;
        };

        for column in inputs {
            if let Some(other) = sequences.get(column) {
                if other.kind() != primary.kind() {
                    return Err(SchemaError::IndexMismatch {
                        descriptor: position,
                        primary: primary_name.clone(),
                        other: column.clone(),
                    });
                }
            }
        }

        if let Err(WindowError::IncompatibleIndex { unit, kind }) =
            descriptor.window().check_index(primary.kind())
        {
            return Err(SchemaError::IncompatibleWindow {
                descriptor: position,
                column: primary_name.clone(),
                unit,
                kind,
            });
        }

        match axis {
            None => axis = Some((primary_name.as_str(), primary.kind())),
            Some((first, kind)) if kind != primary.kind() => {
                return Err(SchemaError::MixedAxes {
                    first: first.to_string(),
                    other: primary_name.clone(),
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureError;
    use time_sequence::{IndexKind, TimeSequence, Timestamp};
    use window_functions::{Correlation, FuncWrapper, Statistic, Statistics};
    use windowing::WindowSpec;

    fn sequences() -> SequenceSet {
        SequenceSet::new()
            .with(TimeSequence::offsets("a", (0..10).collect(), vec![1.0; 10]).unwrap())
            .unwrap()
            .with(TimeSequence::offsets("b", (0..10).collect(), vec![2.0; 10]).unwrap())
            .unwrap()
    }

    fn mean(column: &str) -> FeatureDescriptor {
        FeatureDescriptor::new(Statistics::single(Statistic::Mean), [column], WindowSpec::samples(3, 2))
    }

    fn check(descriptors: &[FeatureDescriptor]) -> Result<()> {
        validate(descriptors, &sequences(), &ExtractionConfig::default())
    }

    #[test]
    fn test_valid_table() {
        assert!(check(&[mean("a"), mean("b")]).is_ok());
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let err = check(&[mean("a"), mean("a")]).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::Config(ConfigError::DuplicateOutput { first: 0, second: 1, .. })
        ));
    }

    #[test]
    fn test_override_collision_rejected() {
        let renamed = mean("b").with_output_names(["a__mean__w=3_s=2"]);
        assert!(matches!(
            check(&[mean("a"), renamed]),
            Err(FeatureError::Config(ConfigError::DuplicateOutput { .. }))
        ));
    }

    #[test]
    fn test_unknown_column_rejected() {
        assert!(matches!(
            check(&[mean("missing")]),
            Err(FeatureError::Config(ConfigError::UnknownColumn { descriptor: 0, .. }))
        ));
    }

    #[test]
    fn test_bad_window_rejected() {
        let zero = FeatureDescriptor::new(Statistics::single(Statistic::Sum), ["a"], WindowSpec::samples(3, 0));
        assert!(matches!(
            check(&[zero]),
            Err(FeatureError::Config(ConfigError::Window {
                source: WindowError::NonPositive { field: "stride" },
                ..
            }))
        ));

        let empty = FeatureDescriptor::new(
            Statistics::single(Statistic::Sum),
            ["a"],
            WindowSpec::samples(3, 1).with_min_occupancy(0),
        );
        assert!(matches!(
            check(&[empty]),
            Err(FeatureError::Config(ConfigError::Window {
                source: WindowError::ZeroOccupancy,
                ..
            }))
        ));
    }

    #[test]
    fn test_output_arity_mismatch_rejected() {
        let d = mean("a").with_output_names(["x", "y"]);
        assert!(matches!(
            check(&[d]),
            Err(FeatureError::Config(ConfigError::OutputArity { expected: 1, actual: 2, .. }))
        ));
    }

    #[test]
    fn test_input_arity_mismatch_rejected() {
        let d = FeatureDescriptor::new(Correlation, ["a"], WindowSpec::samples(3, 2));
        assert!(matches!(
            check(&[d]),
            Err(FeatureError::Config(ConfigError::InputArity { expected: 2, actual: 1, .. }))
        ));

        let any = FuncWrapper::scalar("n", |v| v.len() as f64).with_input_arity(None);
        assert!(check(&[FeatureDescriptor::new(any, ["a", "b"], WindowSpec::samples(3, 2))]).is_ok());
    }

    #[test]
    fn test_unknown_primary_rejected() {
        let d = FeatureDescriptor::new(Correlation, ["a", "b"], WindowSpec::samples(3, 2)).with_primary("c");
        assert!(matches!(
            check(&[d]),
            Err(FeatureError::Config(ConfigError::UnknownPrimary { .. }))
        ));
    }

    #[test]
    fn test_index_kind_mismatch_is_schema_error() {
        let clock = TimeSequence::new(
            "clock",
            IndexKind::WallClock,
            vec![Timestamp(0), Timestamp(1_000_000_000)],
            vec![Some(1.0), Some(2.0)],
        )
        .unwrap();
        let set = sequences().with(clock).unwrap();

        let paired = FeatureDescriptor::new(Correlation, ["a", "clock"], WindowSpec::samples(1, 1));
        assert!(matches!(
            validate(&[paired], &set, &ExtractionConfig::default()),
            Err(FeatureError::Schema(SchemaError::IndexMismatch { .. }))
        ));

        let split = [mean("a"), mean("clock")];
        assert!(matches!(
            validate(&split, &set, &ExtractionConfig::default()),
            Err(FeatureError::Schema(SchemaError::MixedAxes { .. }))
        ));

        let seconds = FeatureDescriptor::new(Statistics::single(Statistic::Max), ["a"], WindowSpec::seconds(1.0, 1.0));
        assert!(matches!(
            validate(&[seconds], &set, &ExtractionConfig::default()),
            Err(FeatureError::Schema(SchemaError::IncompatibleWindow { .. }))
        ));
    }
}
