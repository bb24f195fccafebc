use crate::error::{Error, Result};
use crate::feed::ResolvedEntry;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

pub const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

/// Channel-level metadata for the combined document.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// Serializes resolved entries into an RSS 2.0 document with `content:encoded`.
#[derive(Debug, Clone)]
pub struct FeedWriter {
    channel: ChannelInfo,
}

fn xml_err<E: Display>(err: E) -> Error {
    Error::Xml(err.to_string())
}

impl FeedWriter {
    pub fn new(channel: ChannelInfo) -> Self {
        Self { channel }
    }

    pub fn to_xml(&self, entries: &[ResolvedEntry]) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_err)?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        rss.push_attribute(("xmlns:content", CONTENT_NAMESPACE));
        writer.write_event(Event::Start(rss)).map_err(xml_err)?;
        writer.write_event(Event::Start(BytesStart::new("channel"))).map_err(xml_err)?;

        write_text_element(&mut writer, "title", &self.channel.title)?;
        write_text_element(&mut writer, "link", &self.channel.link)?;
        write_text_element(&mut writer, "description", &self.channel.description)?;

        for resolved in entries {
            self.write_item(&mut writer, resolved)?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel"))).map_err(xml_err)?;
        writer.write_event(Event::End(BytesEnd::new("rss"))).map_err(xml_err)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn write_item(&self, writer: &mut Writer<Vec<u8>>, resolved: &ResolvedEntry) -> Result<()> {
        let entry = &resolved.entry;

        writer.write_event(Event::Start(BytesStart::new("item"))).map_err(xml_err)?;
        write_text_element(writer, "title", &entry.title)?;
        write_text_element(writer, "link", &resolved.archive_link)?;
        write_text_element(writer, "guid", &entry.original_link)?;
        write_text_element(writer, "description", &entry.summary)?;
        write_text_element(writer, "pubDate", &entry.published_at.to_rfc2822())?;

        writer
            .write_event(Event::Start(BytesStart::new("content:encoded")))
            .map_err(xml_err)?;
        let content = strip_invalid_xml_chars(&resolved.full_content);
        for section in cdata_sections(&content) {
            writer
                .write_event(Event::CData(BytesCData::new(section)))
                .map_err(xml_err)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("content:encoded")))
            .map_err(xml_err)?;

        writer.write_event(Event::End(BytesEnd::new("item"))).map_err(xml_err)?;
        Ok(())
    }

    /// Write the document next to `path` and swap it into place, so readers
    /// only ever see the previous file or the complete new one.
    pub fn write_to_path<P: AsRef<Path>>(&self, entries: &[ResolvedEntry], path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_xml(entries)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path)?;

        info!("Wrote {} items ({} bytes) to {}", entries.len(), bytes.len(), path.display());
        Ok(())
    }
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    let text = strip_invalid_xml_chars(text);
    writer.write_event(Event::Start(BytesStart::new(name))).map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new(&text))).map_err(xml_err)?;
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_err)?;
    Ok(())
}

/// Split content so no section contains the CDATA terminator `]]>`.
fn cdata_sections(content: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = content;
    while let Some(pos) = rest.find("]]>") {
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

/// Drop characters XML 1.0 does not allow, even escaped.
fn strip_invalid_xml_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedEntry;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn channel() -> ChannelInfo {
        ChannelInfo {
            title: "Combined Test Feed".to_string(),
            link: "https://example.com/".to_string(),
            description: "Merged feed for tests".to_string(),
        }
    }

    fn resolved(link: &str, content: &str) -> ResolvedEntry {
        ResolvedEntry::new(
            FeedEntry {
                title: "Markets & <Money>".to_string(),
                original_link: link.to_string(),
                summary: "Rates rise again".to_string(),
                published_at: Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap(),
            },
            format!("https://archive.is/o/nuunc/{}", link),
            content.to_string(),
        )
    }

    fn render(entries: &[ResolvedEntry]) -> String {
        String::from_utf8(FeedWriter::new(channel()).to_xml(entries).unwrap()).unwrap()
    }

    #[test]
    fn test_document_header_and_channel() {
        let xml = render(&[]);

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">"#));
        assert!(xml.contains("<title>Combined Test Feed</title>"));
        assert!(xml.contains("<description>Merged feed for tests</description>"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn test_item_fields() {
        let xml = render(&[resolved("https://example.com/a", "<article><p>Body</p></article>")]);

        assert!(xml.contains("<title>Markets &amp; &lt;Money&gt;</title>"));
        assert!(xml.contains("<link>https://archive.is/o/nuunc/https://example.com/a</link>"));
        assert!(xml.contains("<guid>https://example.com/a</guid>"));
        assert!(xml.contains("<description>Rates rise again</description>"));
        assert!(xml.contains("<pubDate>Fri, 15 Mar 2024 09:00:00 +0000</pubDate>"));
        assert!(xml.contains("<content:encoded><![CDATA[<article><p>Body</p></article>]]></content:encoded>"));
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let xml = render(&[resolved("https://example.com/a", "before]]>after")]);

        assert!(xml.contains("<![CDATA[before]]]]><![CDATA[>after]]>"));
    }

    #[test]
    fn test_cdata_sections() {
        assert_eq!(cdata_sections("plain"), vec!["plain"]);
        assert_eq!(cdata_sections("a]]>b]]>c"), vec!["a]]", ">b]]", ">c"]);
        assert_eq!(cdata_sections(""), vec![""]);
    }

    #[test]
    fn test_output_parses_back() {
        let entries = vec![
            resolved("https://example.com/a", "<div>one <b>two</b></div>"),
            resolved("https://example.com/b", "Full text \u{0007}not available."),
        ];
        let bytes = FeedWriter::new(channel()).to_xml(&entries).unwrap();

        let feed = feed_rs::parser::parse(&bytes[..]).unwrap();
        assert_eq!(feed.entries.len(), 2);

        let first = &feed.entries[0];
        assert_eq!(first.id, "https://example.com/a");
        let body = first.content.as_ref().and_then(|c| c.body.clone()).unwrap();
        assert!(body.contains("<div>one <b>two</b></div>"));

        let second_body = feed.entries[1].content.as_ref().and_then(|c| c.body.clone()).unwrap();
        assert!(second_body.contains("Full text not available."));
    }

    #[test]
    fn test_write_to_path_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("combined.xml");
        std::fs::write(&path, "old contents").unwrap();

        let writer = FeedWriter::new(channel());
        writer.write_to_path(&[resolved("https://example.com/a", "x")], &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<guid>https://example.com/a</guid>"));
        assert!(!written.contains("old contents"));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("combined.xml");

        let result = FeedWriter::new(channel()).write_to_path(&[], &path);
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!path.exists());
    }
}
