pub mod cache {

    /// Days a cached search stays eligible as a cache hit.
    pub const SEARCH_TTL_DAYS: i64 = 3;
}

pub mod provider {

    /// Results requested per provider call.
    pub const PAGE_SIZE: u32 = 20;

    pub const ATTRIBUTION: &str = "Images from Pixabay";

    /// Base for rebuilding asset URLs from an image id alone.
    pub const CDN_BASE: &str = "https://pixabay.com/get";
}

pub mod limits {

    pub const MIN_PASSWORD_LENGTH: usize = 8;
}
