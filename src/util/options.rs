use std::default::Default;
use strum_macros::EnumString;

/// Which heuristics decide whether a major or minor collection is due.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumString)]
pub enum OOBTriggerSelector {
    /// Predict the next collection from the allocation window the collector opened at its last
    /// sweep, and the allocation rate observed between `run()` calls.
    AllocationLimit,
    /// Ask the host's own `is_major_collection_due()` and `is_minor_collection_due()`.
    Delegated,
}

/// The default cap for the largest allocation burst we plan headroom for.
pub const DEFAULT_MAX_THRESHOLD_CAP: usize = 200_000;
/// The default fraction of the old generation limit at which a major collection is considered due.
pub const DEFAULT_OLD_OBJECTS_RATIO: f64 = 0.97;
/// The default fraction of the largest burst kept as headroom before the allocation limit.
pub const DEFAULT_MAJOR_HEADROOM_RATIO: f64 = 0.98;

fn always_valid<T>(_: &T) -> bool {
    true
}

fn is_ratio(v: &f64) -> bool {
    *v >= 0.0 && *v <= 1.0
}

macro_rules! options {
    ($($name:ident: $type:ty[$validator:expr] = $default:expr),*,) => [
        options!($($name: $type[$validator] = $default),*);
    ];
    ($($name:ident: $type:ty[$validator:expr] = $default:expr),*) => [
        #[derive(Clone, Debug)]
        pub struct Options {
            $(pub $name: $type),*
        }
        impl Options {
            /// Set an option by its name. Returns false (and keeps the old value) if the value
            /// cannot be parsed or is rejected by the option's validator.
            pub fn set_from_str(&mut self, s: &str, val: &str) -> bool {
                match s {
                    // Parse the given value from str (by env vars or by calling set_option()) to the right type
                    $(stringify!($name) => if let Ok(ref val) = val.parse::<$type>() {
                        // Validate
                        let validate_fn = $validator;
                        let is_valid = validate_fn(val);
                        if is_valid {
                            // Only set value if valid.
                            self.$name = val.clone();
                        } else {
                            warn!("Unable to set {}={:?}. Invalid value. Default value will be used.", s, val);
                        }
                        is_valid
                    } else {
                        warn!("Unable to set {}={:?}. Can't parse value. Default value will be used.", s, val);
                        false
                    })*
                    _ => {
                        warn!("Unknown option {}={:?}", s, val);
                        false
                    }
                }
            }

            /// Set options from a string of whitespace-separated `name=value` pairs. Returns true
            /// only if every pair was set.
            pub fn set_bulk_from_str(&mut self, options: &str) -> bool {
                let mut all_ok = true;
                for opt in options.split_ascii_whitespace() {
                    match opt.split_once('=') {
                        Some((name, value)) => all_ok &= self.set_from_str(name, value),
                        None => {
                            warn!("Malformed option {:?}, expected name=value", opt);
                            all_ok = false;
                        }
                    }
                }
                all_ok
            }

            /// Options with their default values, ignoring environment variables.
            pub fn builtin_defaults() -> Self {
                Options {
                    $($name: $default),*
                }
            }
        }
        impl Default for Options {
            fn default() -> Self {
                let mut options = Self::builtin_defaults();

                // If we have env vars that start with OOBGC_ and match any option (such as OOBGC_MAX_THRESHOLD_CAP),
                // we set the option to its value (if it is a valid value). Otherwise, use the default value.
                const PREFIX: &str = "OOBGC_";
                for (key, val) in std::env::vars() {
                    // strip the prefix, and get the lower case string
                    if let Some(rest_of_key) = key.strip_prefix(PREFIX) {
                        let lowercase: &str = &rest_of_key.to_lowercase();
                        match lowercase {
                            $(stringify!($name) => { options.set_from_str(lowercase, &val); },)*
                            _ => {}
                        }
                    }
                }
                options
            }
        }
    ]
}
options! {
    // Which heuristics decide that a collection is due.
    oob_trigger:             OOBTriggerSelector [always_valid] = OOBTriggerSelector::AllocationLimit,
    // Upper bound (in objects) for the largest allocation burst between two run() calls.
    max_threshold_cap:       usize              [|v: &usize| *v > 0] = DEFAULT_MAX_THRESHOLD_CAP,
    // A major collection is only considered when the old generation (or the remembered set)
    // has reached this fraction of its limit.
    old_objects_ratio:       f64                [|v: &f64| *v > 0.0 && *v <= 1.0] = DEFAULT_OLD_OBJECTS_RATIO,
    // A major collection is due once fewer than (largest burst * this ratio) objects are left
    // before the allocation limit.
    major_headroom_ratio:    f64                [is_ratio] = DEFAULT_MAJOR_HEADROOM_RATIO,
    // Print the counters when the controller is torn down.
    print_stats_on_teardown: bool               [always_valid] = false,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_util::{serial_test, with_cleanup};

    #[test]
    fn no_env_var() {
        serial_test(|| {
            let options = Options::default();
            assert_eq!(options.max_threshold_cap, DEFAULT_MAX_THRESHOLD_CAP);
            assert_eq!(options.oob_trigger, OOBTriggerSelector::AllocationLimit);
        })
    }

    #[test]
    fn with_valid_env_var() {
        serial_test(|| {
            with_cleanup(
                || {
                    std::env::set_var("OOBGC_MAX_THRESHOLD_CAP", "4096");

                    let options = Options::default();
                    assert_eq!(options.max_threshold_cap, 4096);
                },
                || {
                    std::env::remove_var("OOBGC_MAX_THRESHOLD_CAP");
                },
            )
        })
    }

    #[test]
    fn with_multiple_valid_env_vars() {
        serial_test(|| {
            with_cleanup(
                || {
                    std::env::set_var("OOBGC_OOB_TRIGGER", "Delegated");
                    std::env::set_var("OOBGC_PRINT_STATS_ON_TEARDOWN", "true");

                    let options = Options::default();
                    assert_eq!(options.oob_trigger, OOBTriggerSelector::Delegated);
                    assert!(options.print_stats_on_teardown);
                },
                || {
                    std::env::remove_var("OOBGC_OOB_TRIGGER");
                    std::env::remove_var("OOBGC_PRINT_STATS_ON_TEARDOWN");
                },
            )
        })
    }

    #[test]
    fn with_invalid_env_var_value() {
        serial_test(|| {
            with_cleanup(
                || {
                    // invalid value, we cannot parse the value, so use the default value
                    std::env::set_var("OOBGC_MAX_THRESHOLD_CAP", "abc");
                    // parses, but the validator rejects it
                    std::env::set_var("OOBGC_OLD_OBJECTS_RATIO", "1.5");

                    let options = Options::default();
                    assert_eq!(options.max_threshold_cap, DEFAULT_MAX_THRESHOLD_CAP);
                    assert_eq!(options.old_objects_ratio, DEFAULT_OLD_OBJECTS_RATIO);
                },
                || {
                    std::env::remove_var("OOBGC_MAX_THRESHOLD_CAP");
                    std::env::remove_var("OOBGC_OLD_OBJECTS_RATIO");
                },
            )
        })
    }

    #[test]
    fn with_invalid_env_var_key() {
        serial_test(|| {
            with_cleanup(
                || {
                    std::env::set_var("OOBGC_ABC", "42");

                    let options = Options::default();
                    assert_eq!(options.max_threshold_cap, DEFAULT_MAX_THRESHOLD_CAP);
                },
                || {
                    std::env::remove_var("OOBGC_ABC");
                },
            )
        })
    }

    #[test]
    fn set_from_str() {
        let mut options = Options::builtin_defaults();
        assert!(options.set_from_str("major_headroom_ratio", "0.5"));
        assert_eq!(options.major_headroom_ratio, 0.5);
        assert!(!options.set_from_str("max_threshold_cap", "0"));
        assert_eq!(options.max_threshold_cap, DEFAULT_MAX_THRESHOLD_CAP);
        assert!(!options.set_from_str("oob_trigger", "Sometimes"));
        assert_eq!(options.oob_trigger, OOBTriggerSelector::AllocationLimit);
        assert!(!options.set_from_str("no_such_option", "1"));
    }

    #[test]
    fn set_bulk_from_str() {
        let mut options = Options::builtin_defaults();
        assert!(options.set_bulk_from_str("max_threshold_cap=1000 oob_trigger=Delegated"));
        assert_eq!(options.max_threshold_cap, 1000);
        assert_eq!(options.oob_trigger, OOBTriggerSelector::Delegated);

        // One bad pair fails the whole call, but the good pairs are still applied.
        assert!(!options.set_bulk_from_str("max_threshold_cap=2000 old_objects_ratio"));
        assert_eq!(options.max_threshold_cap, 2000);
    }
}
