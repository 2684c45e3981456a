use std::io::Write;

use brrtchannels::channels::ChannelResolver;
use brrtchannels::config::ChannelConfig;
use brrtchannels::error::{ChannelError, ConfigIssue};
use tempfile::Builder;

mod common;
use common::message;

fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_yaml_file() {
    let file = write_config(
        ".yaml",
        "channels:\n  - canary\n  - beta\n  - stable\ncascade: false\ndefault: stable\n",
    );
    let config = ChannelConfig::from_path(file.path()).unwrap();
    assert_eq!(config.channels, vec!["canary", "beta", "stable"]);
    assert!(!config.cascade);
    assert_eq!(config.default.as_deref(), Some("stable"));
}

#[test]
fn test_load_toml_file_and_build_resolver() {
    let file = write_config(".toml", "channels = [\"canary\", \"beta\", \"stable\"]\ndefault = \"beta\"\n");
    let config = ChannelConfig::from_path(file.path()).unwrap();
    assert!(config.cascade);

    let resolver = ChannelResolver::new(config.into_options()).unwrap();
    let app = brrtchannels::Pipeline::new().layer(resolver).layer(
        brrtchannels::pipeline::endpoint(|req| {
            use brrtchannels::ChannelRequestExt;
            brrtchannels::Response::text(
                req.candidates()
                    .map(|c| c.names().join(","))
                    .unwrap_or_default(),
            )
        }),
    );
    assert_eq!(message(&common::get(&app, "/")), "beta,stable");
}

#[test]
fn test_unsupported_extension_and_missing_file() {
    let file = write_config(".json", "{\"channels\": [\"a\"]}");
    let err = ChannelConfig::from_path(file.path()).unwrap_err();
    assert!(matches!(
        err,
        ChannelError::InvalidConfiguration(ConfigIssue::Parse { .. })
    ));

    let dir = tempfile::tempdir().unwrap();
    let err = ChannelConfig::from_path(dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn test_invalid_default_is_rejected_by_resolver() {
    let config = ChannelConfig::from_yaml_str("channels: [alpha]\ndefault: omega\n").unwrap();
    let err = ChannelResolver::new(config.into_options()).unwrap_err();
    assert!(matches!(
        err,
        ChannelError::InvalidConfiguration(ConfigIssue::UnknownDefaultChannel { .. })
    ));
}

#[test]
fn test_config_round_trips_through_yaml() {
    let config = ChannelConfig {
        channels: vec!["alpha".into(), "beta".into()],
        cascade: true,
        default: None,
    };
    let yaml = serde_yaml::to_string(&config).unwrap();
    assert!(!yaml.contains("default"));
    assert_eq!(ChannelConfig::from_yaml_str(&yaml).unwrap(), config);
}
