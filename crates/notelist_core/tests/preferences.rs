use notelist_core::config::PREF_BACKGROUND_COLOR;
use notelist_core::db::{open_db, open_db_in_memory};
use notelist_core::{
    ListConfig, PreferenceStore, RepoError, SqlitePreferenceStore, DEFAULT_BACKGROUND_COLOR,
};

#[test]
fn missing_preference_loads_default_config() {
    let conn = open_db_in_memory().unwrap();
    let preferences = SqlitePreferenceStore::new(&conn);

    assert_eq!(preferences.load_u32(PREF_BACKGROUND_COLOR).unwrap(), None);
    let config = ListConfig::load(&preferences).unwrap();
    assert_eq!(config.background_color, DEFAULT_BACKGROUND_COLOR);
    assert_eq!(config.palette_index(), 0);
}

#[test]
fn saved_color_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.db");

    {
        let conn = open_db(&path).unwrap();
        let preferences = SqlitePreferenceStore::new(&conn);
        ListConfig {
            background_color: 0xFFFF_F9C4,
        }
        .save(&preferences)
        .unwrap();
        ListConfig {
            background_color: 0xFFE1_BEE7,
        }
        .save(&preferences)
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let config = ListConfig::load(&SqlitePreferenceStore::new(&conn)).unwrap();
    assert_eq!(config.background_color, 0xFFE1_BEE7);
    assert_eq!(config.palette_index(), 6);
}

#[test]
fn stored_value_outside_u32_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO preferences (key, value) VALUES (?1, -5);",
        [PREF_BACKGROUND_COLOR],
    )
    .unwrap();

    let err = ListConfig::load(&SqlitePreferenceStore::new(&conn)).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
