use crate::types::{Backup, Cluster, Restore, Schedule, StorageLocation};

/// Default number of records shown per page.
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Exposes a record's searchable columns by field name.
///
/// Returning `None` for a field (unknown or unset) simply means the field
/// never matches; lookups must not fail.
pub trait SearchFields {
    fn search_field(&self, field: &str) -> Option<String>;
}

/// Client-side substring search and pagination over an in-memory collection.
///
/// Used uniformly by every resource listing. Search is a trimmed,
/// case-insensitive substring match: a record matches when *any* configured
/// field contains the query. Pages are 1-indexed.
#[derive(Debug, Clone)]
pub struct TableView<T> {
    records: Vec<T>,
    fields: Vec<String>,
    search: String,
    page: usize,
    page_size: usize,
}

impl<T> TableView<T>
where
    T: SearchFields,
{
    /// Creates a view over the records, searching the given fields, with the
    /// default page size.
    pub fn new(records: Vec<T>, fields: &[&str]) -> Self {
        Self::with_page_size(records, fields, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(records: Vec<T>, fields: &[&str], page_size: usize) -> Self {
        Self {
            records,
            fields: fields.iter().map(|field| (*field).to_owned()).collect(),
            search: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Replaces the backing records, keeping search and page untouched.
    ///
    /// Poll-driven refreshes swap the data in place without disturbing what
    /// the operator is looking at.
    pub fn set_records(&mut self, records: Vec<T>) {
        self.records = records;
    }

    /// Sets the search query and resets the current page to 1.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.page = 1;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Moves to the given 1-indexed page.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Changes the page size.
    ///
    /// Deliberately does not reset the current page, mirroring the behavior
    /// this helper was ported from; an out-of-range page simply yields an
    /// empty slice.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn filtered(&self) -> Vec<&T> {
        let query = self.search.trim().to_lowercase();

        if query.is_empty() {
            return self.records.iter().collect();
        }

        self.records
            .iter()
            .filter(|record| {
                self.fields.iter().any(|field| {
                    record
                        .search_field(field)
                        .is_some_and(|value| value.to_lowercase().contains(&query))
                })
            })
            .collect()
    }

    /// Number of records matching the current search.
    pub fn total_records(&self) -> usize {
        self.filtered().len()
    }

    /// The slice of filtered records visible on the current page.
    pub fn paginated_records(&self) -> Vec<&T> {
        let filtered = self.filtered();
        let start = (self.page - 1) * self.page_size;

        if start >= filtered.len() {
            return Vec::new();
        }

        let end = (start + self.page_size).min(filtered.len());
        filtered[start..end].to_vec()
    }
}

impl SearchFields for Backup {
    fn search_field(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "namespace" => Some(self.namespace.clone()),
            "phase" => Some(self.phase.clone()),
            "storage_location" => Some(self.storage_location.clone()),
            _ => None,
        }
    }
}

impl SearchFields for Restore {
    fn search_field(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "namespace" => Some(self.namespace.clone()),
            "phase" => Some(self.phase.clone()),
            "backup_name" => Some(self.backup_name.clone()),
            _ => None,
        }
    }
}

impl SearchFields for Schedule {
    fn search_field(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "phase" => Some(self.phase.clone()),
            "schedule" => Some(self.schedule.clone()),
            "storage_location" => Some(self.storage_location.clone()),
            _ => None,
        }
    }
}

impl SearchFields for StorageLocation {
    fn search_field(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "phase" => Some(self.phase.clone()),
            "provider" => Some(self.provider.clone()),
            "bucket" => Some(self.bucket.clone()),
            _ => None,
        }
    }
}

impl SearchFields for Cluster {
    fn search_field(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "namespace" => Some(self.namespace.clone()),
            _ => None,
        }
    }
}
