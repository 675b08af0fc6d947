//! Application-wide constants
//!
//! Storage keys, wire labels and nutrition factors live here so the
//! persisted layout and the remote document shape have a single source of truth.

/// Config and storage file locations
pub mod config {
    /// Directory name under the platform config/data/cache dirs
    pub const APP_DIR: &str = "menu-configurator";

    /// Config file name inside APP_DIR
    pub const FILENAME: &str = "config.json";

    /// Durable key-value store file name inside the data dir
    pub const STORAGE_FILENAME: &str = "storage.json";

    /// Session shadow store file name inside the runtime/cache dir
    pub const SESSION_FILENAME: &str = "session.json";

    /// Fallback catalog file used when no path is configured
    pub const DEFAULT_FALLBACK_CSV: &str = "menu.csv";
}

/// Keys used in the durable and session stores
pub mod storage {
    /// Custom items, category → [item]
    pub const CUSTOM_ITEMS: &str = "customDishes";

    /// Selected names, category → [name]
    pub const SELECTION: &str = "selectedDishes";

    /// Discontinued names, category → [name]
    pub const DISCONTINUED: &str = "discontinuedDishes";

    /// Epoch millis of the last shadow write (session store only)
    pub const BACKUP_TIMESTAMP: &str = "nutritionBackupTime";

    /// Keys mirrored between the durable and session stores
    pub const MIRRORED: [&str; 3] = [CUSTOM_ITEMS, SELECTION, DISCONTINUED];
}

/// Remote document labels
pub mod wire {
    /// Status label for items on sale
    pub const STATUS_ACTIVE: &str = "販売中";

    /// Status label for discontinued items
    pub const STATUS_DISCONTINUED: &str = "販売中止";

    /// Collection path segment on the remote
    pub const ITEMS_PATH: &str = "items";
}

/// Energy conversion factors (kcal per gram)
pub mod nutrition {
    pub const PROTEIN_KCAL_PER_GRAM: f64 = 4.0;
    pub const FAT_KCAL_PER_GRAM: f64 = 9.0;
    pub const CARBS_KCAL_PER_GRAM: f64 = 4.0;
}

/// Default category configuration
pub mod categories {
    /// The only category limited to a single pick out of the box (staple: rice or salad)
    pub const DEFAULT_SINGLE_SELECT: &[&str] = &["主食"];

    /// Display order for known categories; unknown ones follow in first-seen order
    pub const DEFAULT_ORDER: &[&str] = &["主食", "ドレッシング", "副菜", "主菜", "SOUP", "DRINK", "その他"];

    /// (category, english label, japanese label)
    pub const DEFAULT_LABELS: &[(&str, &str, &str)] = &[
        ("主食", "RICE/SALAD", "主食"),
        ("主菜", "MAIN", "主菜"),
        ("副菜", "SIDE", "副菜"),
        ("ドレッシング", "DRESSING", "ドレッシング"),
        ("その他", "EXTRAS", "その他"),
        ("SOUP", "SOUP", "スープ"),
        ("DRINK", "DRINK", "ドリンク"),
        // Older category names still present in some persisted data
        ("ごはん", "RICE", "ごはん"),
        ("サラダ", "SALAD", "サラダ"),
        ("メイン", "MAIN", "メイン"),
        ("サイド", "SIDE", "サイド"),
        ("デザート", "DESSERT", "デザート"),
        ("飲み物", "DRINK", "飲み物"),
    ];
}
