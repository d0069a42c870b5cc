// src/process/xml.rs

use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, instrument};

use super::table::{Table, TableBuilder};

/// Parse the site list into a [`Table`].
///
/// Every child of the document root is one site element (one row). A site
/// element's attributes and the text of its direct children become its
/// fields; anything nested deeper is ignored.
///
/// Fails on XML that is not well-formed and on a root with no site elements.
#[instrument(level = "info", skip(xml), fields(bytes = xml.len()))]
pub fn parse_sites(xml: &str) -> Result<Table> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut builder = TableBuilder::default();
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut row_tag = String::new();
    let mut row_text = String::new();
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                match depth {
                    0 => open_root(&mut root_seen)?,
                    1 => {
                        row_tag = local_name(&e);
                        row_text.clear();
                        builder.start_row();
                        set_attributes(&mut builder, &e)?;
                    }
                    2 => field = Some((local_name(&e), String::new())),
                    _ => {}
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => match depth {
                0 => open_root(&mut root_seen)?,
                1 => {
                    builder.start_row();
                    set_attributes(&mut builder, &e)?;
                }
                2 => builder.set(&local_name(&e), None),
                _ => {}
            },
            Ok(Event::End(_)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("unexpected end tag at {}", reader.buffer_position()))?;
                match depth {
                    2 => {
                        if let Some((name, text)) = field.take() {
                            builder.set(&name, non_empty(&text));
                        }
                    }
                    1 => {
                        if let Some(text) = non_empty(&row_text) {
                            builder.set(&row_tag, Some(text));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .with_context(|| format!("bad text at {}", reader.buffer_position()))?;
                push_text(depth, &text, &mut row_text, &mut field)?;
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                push_text(depth, &text, &mut row_text, &mut field)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "XML parse error at {}: {e}",
                    reader.buffer_position()
                ));
            }
            // declaration, comments, processing instructions, doctype
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        bail!("XML document has no root element");
    }
    if depth != 0 {
        bail!("XML document ended with {} unclosed element(s)", depth);
    }

    let table = builder.finish();
    if table.is_empty() {
        bail!("no site elements under the root element");
    }
    debug!(rows = table.len(), columns = table.columns.len(), "parsed sites");
    Ok(table)
}

fn open_root(root_seen: &mut bool) -> Result<()> {
    if *root_seen {
        bail!("content after the root element");
    }
    *root_seen = true;
    Ok(())
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn set_attributes(builder: &mut TableBuilder, e: &BytesStart) -> Result<()> {
    for attr in e.attributes() {
        let attr = attr.with_context(|| format!("malformed attribute on <{}>", local_name(e)))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .with_context(|| format!("bad value for attribute {}", name))?;
        builder.set(&name, (!value.is_empty()).then(|| value.into_owned()));
    }
    Ok(())
}

/// Route character data to whatever is open at `depth`.
fn push_text(
    depth: usize,
    text: &str,
    row_text: &mut String,
    field: &mut Option<(String, String)>,
) -> Result<()> {
    match depth {
        0 if !text.trim().is_empty() => bail!("text outside the root element"),
        2 => row_text.push_str(text),
        3 => {
            if let Some((_, value)) = field.as_mut() {
                value.push_str(text);
            }
        }
        _ => {}
    }
    Ok(())
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<query>
  <row>
    <category>Cultural</category>
    <date_inscribed>2003</date_inscribed>
    <id_number>208</id_number>
    <iso_code>af</iso_code>
    <latitude>34.84694</latitude>
    <longitude>67.82525</longitude>
    <region>Asia and the Pacific</region>
    <site>Cultural Landscape and Archaeological Remains of the Bamiyan Valley</site>
    <states>Afghanistan</states>
  </row>
  <row>
    <category>Cultural</category>
    <date_inscribed>1992</date_inscribed>
    <id_number>570</id_number>
    <iso_code>al</iso_code>
    <region>Europe and North America</region>
    <site>Butrint</site>
    <states>Albania</states>
  </row>
  <row>
    <category>Natural</category>
    <date_inscribed>1982</date_inscribed>
    <id_number>102</id_number>
    <iso_code>dz</iso_code>
    <region>Arab States</region>
    <site>Tassili n'Ajjer</site>
    <states>Algeria</states>
    <short_description>&lt;p&gt;Located in a strange lunar landscape&lt;/p&gt;</short_description>
  </row>
</query>
"#;

    #[test]
    fn test_parse_sample_rows_and_columns() -> Result<()> {
        let table = parse_sites(SAMPLE)?;

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.columns,
            vec![
                "category",
                "date_inscribed",
                "id_number",
                "iso_code",
                "latitude",
                "longitude",
                "region",
                "site",
                "states",
                "short_description",
            ]
        );
        assert_eq!(table.value(1, "site"), Some("Butrint"));
        assert_eq!(table.value(1, "latitude"), None);
        assert_eq!(table.value(0, "short_description"), None);
        assert_eq!(
            table.value(2, "short_description"),
            Some("<p>Located in a strange lunar landscape</p>")
        );
        Ok(())
    }

    #[test]
    fn test_row_count_matches_site_elements() -> Result<()> {
        for n in [1usize, 2, 17] {
            let rows: String = (0..n)
                .map(|i| format!("<row><id_number>{}</id_number></row>", i))
                .collect();
            let table = parse_sites(&format!("<query>{}</query>", rows))?;
            assert_eq!(table.len(), n);
            assert_eq!(table.value(n - 1, "id_number"), Some((n - 1).to_string().as_str()));
        }
        Ok(())
    }

    #[test]
    fn test_attributes_cdata_and_empty_fields() -> Result<()> {
        let xml = r#"<query xmlns:x="urn:x">
            <row id="7" x:lang="en">
                <site><![CDATA[Mount Athos & its <monasteries>]]></site>
                <extension/>
                <states>  Greece  </states>
                <notes>   </notes>
            </row>
        </query>"#;
        let table = parse_sites(xml)?;

        assert_eq!(table.columns, vec!["id", "lang", "site", "extension", "states", "notes"]);
        assert_eq!(table.value(0, "id"), Some("7"));
        assert_eq!(table.value(0, "lang"), Some("en"));
        assert_eq!(table.value(0, "site"), Some("Mount Athos & its <monasteries>"));
        assert_eq!(table.value(0, "extension"), None);
        assert_eq!(table.value(0, "states"), Some("Greece"));
        assert_eq!(table.value(0, "notes"), None);
        Ok(())
    }

    #[test]
    fn test_nested_text_is_ignored_and_duplicates_keep_last() -> Result<()> {
        let xml = "<query><row>\
            <states>France</states><states>Spain</states>\
            <location>Pyrenees<coords><lat>42.6</lat></coords></location>\
            </row></query>";
        let table = parse_sites(xml)?;

        assert_eq!(table.columns, vec!["states", "location"]);
        assert_eq!(table.value(0, "states"), Some("Spain"));
        assert_eq!(table.value(0, "location"), Some("Pyrenees"));
        Ok(())
    }

    #[test]
    fn test_text_directly_in_site_element() -> Result<()> {
        let table = parse_sites("<list><site>Stonehenge</site><site>Avebury</site></list>")?;
        assert_eq!(table.columns, vec!["site"]);
        assert_eq!(table.value(1, "site"), Some("Avebury"));
        Ok(())
    }

    #[test]
    fn test_malformed_documents_fail() {
        let cases = [
            ("mismatched", "<query><row><site>A</row></query>"),
            ("unclosed", "<query><row><site>A</site></row>"),
            ("empty", ""),
            ("no root", "<?xml version=\"1.0\"?><!-- nothing -->"),
            ("two roots", "<query><row/></query><query><row/></query>"),
            ("trailing text", "<query><row/></query>junk"),
            ("bad entity", "<query><row><site>&bogus;</site></row></query>"),
            ("not xml", "<html><body><p>Service unavailable"),
        ];
        for (label, xml) in cases {
            assert!(parse_sites(xml).is_err(), "{} should fail", label);
        }
    }

    #[test]
    fn test_root_without_sites_fails() {
        let err = parse_sites("<query>\n</query>").expect_err("empty root must fail");
        assert!(err.to_string().contains("no site elements"));
        assert!(parse_sites("<query/>").is_err());
    }
}
