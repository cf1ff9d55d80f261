use photo_grid::config::{Configuration, fps_to_interval};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
photo-library-path: "/photos"
width: 800
height: 600
columns: 4
rows: 3
anim-fps: 25
anim-steps: 12
populate-fps: 10
fullscreen: true
watch: false
loader-queue: 2
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.photo_library_path, PathBuf::from("/photos"));
    assert_eq!((cfg.width, cfg.height), (800, 600));
    assert_eq!((cfg.columns, cfg.rows), (4, 3));
    assert_eq!(cfg.anim_fps, 25);
    assert_eq!(cfg.anim_steps, 12);
    assert_eq!(cfg.populate_fps, 10);
    assert!(cfg.fullscreen);
    assert!(!cfg.watch);
    assert_eq!(cfg.loader_queue, 2);
}

#[test]
fn missing_keys_fall_back_to_defaults() {
    let cfg: Configuration = serde_yaml::from_str("photo-library-path: \"/p\"\n").unwrap();
    assert_eq!(cfg.photo_library_path, PathBuf::from("/p"));
    assert_eq!((cfg.width, cfg.height), (640, 480));
    assert_eq!((cfg.columns, cfg.rows), (3, 3));
    assert_eq!(cfg.anim_fps, 50);
    assert_eq!(cfg.anim_steps, 10);
    assert_eq!(cfg.populate_fps, 20);
    assert!(!cfg.fullscreen);
    assert!(cfg.watch);
    assert!(cfg.validated().is_ok());
}

#[test]
fn validated_rejects_degenerate_grids() {
    let zero_rows = Configuration {
        rows: 0,
        ..Configuration::default()
    };
    assert!(zero_rows.validated().is_err());

    let zero_cols = Configuration {
        columns: 0,
        ..Configuration::default()
    };
    assert!(zero_cols.validated().is_err());

    let too_many = Configuration {
        width: 2,
        columns: 3,
        ..Configuration::default()
    };
    assert!(too_many.validated().is_err());
}

#[test]
fn validated_rejects_unusable_timing() {
    let short = Configuration {
        anim_steps: 3,
        ..Configuration::default()
    };
    let err = short.validated().unwrap_err();
    assert!(err.to_string().contains("anim-steps"));

    let still = Configuration {
        anim_fps: 0,
        ..Configuration::default()
    };
    assert!(still.validated().is_err());

    let no_queue = Configuration {
        loader_queue: 0,
        ..Configuration::default()
    };
    assert!(no_queue.validated().is_err());
}

#[test]
fn unknown_type_is_a_config_error() {
    let err = serde_yaml::from_str::<Configuration>("columns: three\n").unwrap_err();
    assert!(err.to_string().contains("columns"));
}

#[test]
fn loads_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "columns: 5\nrows: 2\n").unwrap();

    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!((cfg.columns, cfg.rows), (5, 2));

    assert!(Configuration::from_yaml_file(dir.path().join("missing.yaml")).is_err());
}

#[test]
fn fps_maps_to_whole_millisecond_interval() {
    assert_eq!(fps_to_interval(50), Duration::from_millis(20));
    assert_eq!(fps_to_interval(20), Duration::from_millis(50));
    assert_eq!(fps_to_interval(0), Duration::from_millis(1000));
}
