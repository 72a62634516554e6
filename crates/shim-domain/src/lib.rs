#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod descriptor;
pub mod error;
pub mod metadata;
pub mod record;
pub mod requirement;
pub mod scheme;
pub mod search_path;
pub mod wheel_name;

pub use descriptor::{BuildDescriptor, DEFAULT_DESCRIPTOR_FILE, PYTHON_PLACEHOLDER};
pub use error::{Result, ShimError};
pub use metadata::{Manifest, MetadataRecord};
pub use record::{
    render_install_record, translate_record, DIST_INFO_SUFFIX, EGG_INFO_SUFFIX, RECORD_FILE,
};
pub use requirement::Dependency;
pub use scheme::{
    change_root, resolve_scheme, InstallScheme, ProbeRequest, SchemeKind, SchemeOptions,
    SysconfigPaths, SysconfigProbe,
};
pub use search_path::{combine_pythonpath, search_path_delta, split_pythonpath};
pub use wheel_name::WheelName;

pub use pep508_rs::MarkerEnvironment;
