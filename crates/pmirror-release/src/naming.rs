//! Names that must stay bit-exact across runs: consumers resolve releases
//! by tag, import the package by module path, and read the commit message.

use pmirror_catalog::{PROTO_FILE_PREFIX, PROTO_FILE_SUFFIX};
use pmirror_types::Version;

/// `v<major>.<minor>.<build>`
pub fn tag_name(version: &Version) -> String {
    version.tag_name()
}

/// `<prefix>/v<major>`
pub fn module_path(prefix: &str, version: &Version) -> String {
    format!("{}/v{}", prefix.trim_end_matches('/'), version.major)
}

/// `tfplugin<major>`
pub fn package_dir_name(version: &Version) -> String {
    format!("{PROTO_FILE_PREFIX}{}", version.major)
}

/// `tfplugin<major>.proto`
pub fn proto_file_name(version: &Version) -> String {
    format!("{}{PROTO_FILE_SUFFIX}", package_dir_name(version))
}

pub fn commit_message(version: &Version) -> String {
    format!(
        "Auto-generated module for protocol v{}.{}",
        version.major, version.minor
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventions_for_protocol_five_two() {
        let v = Version::new(5, 2, 0);
        assert_eq!(tag_name(&v), "v5.2.0");
        assert_eq!(
            module_path("github.com/example/proto-go/", &v),
            "github.com/example/proto-go/v5"
        );
        assert_eq!(package_dir_name(&v), "tfplugin5");
        assert_eq!(proto_file_name(&v), "tfplugin5.proto");
        assert_eq!(commit_message(&v), "Auto-generated module for protocol v5.2");
    }

    #[test]
    fn build_component_only_affects_the_tag() {
        let v = Version::new(6, 0, 3);
        assert_eq!(tag_name(&v), "v6.0.3");
        assert_eq!(commit_message(&v), "Auto-generated module for protocol v6.0");
    }
}
