//! Lookup of options in a legacy `setup.py` argument list.
//!
//! Installers pass many options we do not model (`--compile`,
//! `--single-version-externally-managed`, ...), so arguments are scanned
//! rather than parsed and anything unrecognised is ignored.

/// Value of the first option in `names`, as either `--name value` or
/// `--name=value`.
pub(crate) fn option_value<'a>(args: &'a [String], names: &[&str]) -> Option<&'a str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        for name in names {
            if arg == name {
                return iter.next().map(String::as_str);
            }
            if let Some(value) = arg
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
            {
                return Some(value);
            }
        }
    }
    None
}
