use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tagwire_codec::{SerializableFactory, Value};

use crate::convert::value_to_json;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ValueOutput<'a> {
    tag: &'a str,
    value_type: String,
    value: serde_json::Value,
    peer_id: &'a str,
    timestamp: String,
}

pub fn print_value(value: &Value, peer_id: &str, format: OutputFormat) {
    println!("{}", render_value(value, peer_id, format));
}

fn render_value(value: &Value, peer_id: &str, format: OutputFormat) -> String {
    let tag = SerializableFactory::global()
        .tag_for(value.value_type())
        .unwrap_or("?");
    let rendered = value_to_json(value);

    match format {
        OutputFormat::Json => {
            let out = ValueOutput {
                tag,
                value_type: value.type_name(),
                value: rendered,
                peer_id,
                timestamp: now_unix_seconds(),
            };
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TAG", "PEER", "VALUE"])
                .add_row(vec![tag.to_string(), peer_id.to_string(), rendered.to_string()]);
            table.to_string()
        }
        OutputFormat::Pretty => format!("tag={tag} peer={peer_id} value={rendered}"),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_line_carries_tag_and_value() {
        let line = render_value(&Value::from("hello"), "peer-1", OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&line).expect("output should be json");
        assert_eq!(parsed["tag"], "str");
        assert_eq!(parsed["value"], "hello");
        assert_eq!(parsed["peer_id"], "peer-1");
    }

    #[test]
    fn pretty_is_single_line() {
        let line = render_value(&Value::SignedInt(-3), "peer-2", OutputFormat::Pretty);
        assert_eq!(line, "tag=sint peer=peer-2 value=-3");
    }

    #[test]
    fn table_has_header() {
        let table = render_value(&Value::Bool(true), "peer-3", OutputFormat::Table);
        assert!(table.contains("TAG"));
        assert!(table.contains("bool"));
    }
}
