//! NDJSON record shapes for the CLI
//!
//! One record per stdout line. Entry records keep the redirect/content split
//! visible: a redirect carries `redirect` and nothing else, a content entry
//! carries `cluster` and `blob`.

use serde::Serialize;
use zim_parser::{Cluster, DirectoryEntry, EntryTarget, Header, PointerEntry};

#[derive(Debug, Serialize)]
pub struct HeaderRecord {
    pub version: u32,
    pub uuid: String,
    pub entry_count: u32,
    pub cluster_count: u32,
    pub url_ptr_pos: u64,
    pub title_ptr_pos: u64,
    pub cluster_ptr_pos: u64,
    pub mime_list_pos: u64,
    pub main_page: Option<u32>,
    pub layout_page: Option<u32>,
    pub checksum_pos: u64,
}

impl From<&Header> for HeaderRecord {
    fn from(header: &Header) -> Self {
        Self {
            version: header.version,
            uuid: header.uuid_hex(),
            entry_count: header.entry_count,
            cluster_count: header.cluster_count,
            url_ptr_pos: header.url_ptr_pos,
            title_ptr_pos: header.title_ptr_pos,
            cluster_ptr_pos: header.cluster_ptr_pos,
            mime_list_pos: header.mime_list_pos,
            main_page: header.main_page,
            layout_page: header.layout_page,
            checksum_pos: header.checksum_pos,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PointerRecord {
    pub index: u32,
    pub offset: u64,
}

impl From<PointerEntry> for PointerRecord {
    fn from(entry: PointerEntry) -> Self {
        Self {
            index: entry.index,
            offset: entry.offset,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub offset: u64,
    pub mime: u16,
    pub namespace: char,
    pub revision: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<u32>,
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

impl EntryRecord {
    pub fn new(
        index: Option<u32>,
        offset: u64,
        entry: &DirectoryEntry,
        contents: Option<String>,
    ) -> Self {
        let (redirect, cluster, blob) = match entry.target {
            EntryTarget::Redirect { entry } => (Some(entry), None, None),
            EntryTarget::Content { cluster, blob } => (None, Some(cluster), Some(blob)),
        };

        Self {
            index,
            offset,
            mime: entry.mime_type,
            namespace: entry.namespace,
            revision: entry.revision,
            redirect,
            cluster,
            blob,
            url: entry.url.clone(),
            title: entry.title.clone(),
            contents,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClusterRecord {
    pub index: u32,
    pub offset: u64,
    pub compression: u8,
    pub blob_count: u32,
    pub blobs: Vec<String>,
}

impl From<&Cluster> for ClusterRecord {
    fn from(cluster: &Cluster) -> Self {
        Self {
            index: cluster.index(),
            offset: cluster.offset(),
            compression: cluster.compression(),
            blob_count: cluster.blob_count(),
            blobs: cluster
                .blobs()
                .map(|blob| String::from_utf8_lossy(blob).into_owned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_entry() -> DirectoryEntry {
        DirectoryEntry {
            mime_type: 0,
            namespace: '-',
            revision: 0,
            target: EntryTarget::Content {
                cluster: 9,
                blob: 472,
            },
            url: "j/body.js".to_string(),
            title: String::new(),
        }
    }

    #[test]
    fn test_content_entry_record_shape() {
        let record = EntryRecord::new(Some(1), 55233, &content_entry(), None);
        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(
            json,
            "{\"index\":1,\"offset\":55233,\"mime\":0,\"namespace\":\"-\",\"revision\":0,\
             \"cluster\":9,\"blob\":472,\"url\":\"j/body.js\",\"title\":\"\"}"
        );
    }

    #[test]
    fn test_redirect_entry_record_has_no_locator() {
        let entry = DirectoryEntry {
            mime_type: zim_parser::REDIRECT_MIME,
            namespace: 'A',
            revision: 0,
            target: EntryTarget::Redirect { entry: 2435 },
            url: "main".to_string(),
            title: "Main".to_string(),
        };
        let json = serde_json::to_string(&EntryRecord::new(None, 100, &entry, None)).unwrap();

        assert!(json.contains("\"redirect\":2435"));
        assert!(!json.contains("\"cluster\""));
        assert!(!json.contains("\"blob\""));
        assert!(!json.contains("\"contents\""));
        assert!(!json.contains("\"index\""));
    }

    #[test]
    fn test_contents_attached() {
        let record = EntryRecord::new(
            Some(0),
            55212,
            &content_entry(),
            Some("var x = 1;".to_string()),
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.ends_with("\"contents\":\"var x = 1;\"}"));
    }
}
