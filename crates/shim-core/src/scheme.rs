//! Interpreter-backed install scheme lookup.

use anyhow::Context;
use shim_domain::{ProbeRequest, SysconfigPaths, SysconfigProbe};

use crate::python_sys::{probe_python, PythonProbe};

const SCHEME_SCRIPT: &str = r#"import json, os, sys, sysconfig
request = json.loads(sys.argv[1])
kind = request["kind"]
preferred = getattr(sysconfig, "get_preferred_scheme", None)
if kind == "default":
    default = getattr(sysconfig, "get_default_scheme", None)
    if default is not None:
        scheme = default()
    else:
        scheme = "nt" if os.name == "nt" else "posix_prefix"
elif preferred is not None:
    scheme = preferred(kind)
elif kind == "user":
    scheme = "nt_user" if os.name == "nt" else "posix_user"
else:
    scheme = "nt" if os.name == "nt" else "posix_home"
overrides = {}
if request.get("base"):
    overrides["base"] = request["base"]
    overrides["platbase"] = request["base"]
paths = sysconfig.get_paths(scheme=scheme, vars=overrides or None)
data = {
    "purelib": paths["purelib"],
    "platlib": paths["platlib"],
    "include": paths["include"],
    "scripts": paths["scripts"],
    "data": paths["data"],
    "prefix": sys.prefix,
    "base_prefix": getattr(sys, "base_prefix", sys.prefix),
    "real_prefix": getattr(sys, "real_prefix", None),
    "python_version": f"{sys.version_info[0]}.{sys.version_info[1]}",
}
print(json.dumps(data))
"#;

impl SysconfigProbe for PythonProbe {
    fn probe(&self, request: &ProbeRequest) -> anyhow::Result<SysconfigPaths> {
        let encoded = serde_json::to_string(request).context("failed to encode scheme request")?;
        // -I ignores user site-packages and PYTHON* variables.
        let flags: &[&str] = if request.isolated { &["-I"] } else { &[] };
        probe_python(self.python(), flags, SCHEME_SCRIPT, &[encoded], "install scheme")
    }
}
