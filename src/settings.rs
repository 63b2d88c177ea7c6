// Settings accessor
// Typed helpers over the app_settings KV table.

use crate::constants::{DEFAULT_NEW_FILE_DAYS, SETTING_NEW_FILE_DAYS};
use crate::error::Result;
use crate::store::VideoStore;

/// Days a freshly discovered video keeps its "new" flag. Defaults to 7 when
/// unset or unparsable; store read failures also fall back to the default.
pub fn get_new_file_duration_days(store: &VideoStore) -> u32 {
    match store.get_setting(SETTING_NEW_FILE_DAYS) {
        Ok(Some(raw)) => parse_days(&raw).unwrap_or_else(|| {
            log::warn!("Invalid {} value {:?}, using {}", SETTING_NEW_FILE_DAYS, raw, DEFAULT_NEW_FILE_DAYS);
            DEFAULT_NEW_FILE_DAYS
        }),
        Ok(None) => DEFAULT_NEW_FILE_DAYS,
        Err(e) => {
            log::warn!("Could not read {}: {}", SETTING_NEW_FILE_DAYS, e);
            DEFAULT_NEW_FILE_DAYS
        }
    }
}

/// Set the new-file threshold in days.
pub fn set_new_file_duration_days(store: &VideoStore, days: u32) -> Result<()> {
    store.set_setting(SETTING_NEW_FILE_DAYS, &days.to_string())
}

fn parse_days(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_default() {
        let store = VideoStore::open_in_memory().unwrap();
        assert_eq!(get_new_file_duration_days(&store), 7);
    }

    #[test]
    fn test_missing_row_defaults() {
        let store = VideoStore::open_in_memory().unwrap();
        store.delete_setting(SETTING_NEW_FILE_DAYS).unwrap();
        assert_eq!(store.get_setting(SETTING_NEW_FILE_DAYS).unwrap(), None);
        assert_eq!(get_new_file_duration_days(&store), 7);
    }

    #[test]
    fn test_invalid_values_default() {
        let store = VideoStore::open_in_memory().unwrap();
        for bad in ["", "abc", "-3", "2.5", "99999999999"] {
            store.set_setting(SETTING_NEW_FILE_DAYS, bad).unwrap();
            assert_eq!(get_new_file_duration_days(&store), 7, "value {:?}", bad);
        }
    }

    #[test]
    fn test_set_and_get() {
        let store = VideoStore::open_in_memory().unwrap();
        set_new_file_duration_days(&store, 30).unwrap();
        assert_eq!(get_new_file_duration_days(&store), 30);
        set_new_file_duration_days(&store, 0).unwrap();
        assert_eq!(get_new_file_duration_days(&store), 0);
    }
}
