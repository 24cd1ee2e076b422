use std::time::Duration;

use tagwire_codec::utils::int_to_bytes;
use tagwire_codec::Value;
use tagwire_peer::{connect_with_config, ChannelConfig};

use crate::cmd::SendArgs;
use crate::convert::json_to_value;
use crate::exit::{codec_error, peer_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_value, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let value = resolve_value(&args)?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;

    let mut config = ChannelConfig::default();
    if args.wait {
        config.socket.read_timeout = Some(wait_timeout);
    }

    let mut channel = connect_with_config(&args.addr, config)
        .map_err(|err| peer_error("connect failed", err))?;
    channel
        .send_value(&value)
        .map_err(|err| peer_error("send failed", err))?;
    tracing::debug!(addr = %args.addr, value_type = %value.type_name(), "value sent");

    if args.wait {
        let reply = channel
            .recv_value()
            .map_err(|err| peer_error("receive failed", err))?;
        print_value(&reply, &args.addr, format);
    }

    Ok(SUCCESS)
}

fn resolve_value(args: &SendArgs) -> CliResult<Value> {
    if let Some(text) = &args.text {
        return Ok(Value::from(text.as_str()));
    }
    if let Some(n) = args.int {
        int_to_bytes(n).map_err(|err| codec_error("--int", err))?;
        return Ok(Value::Int(n));
    }
    if let Some(n) = args.sint {
        return Ok(Value::SignedInt(n));
    }
    if let Some(x) = args.float {
        return Ok(Value::Float(x));
    }
    if let Some(flag) = args.flag {
        return Ok(Value::Bool(flag));
    }
    if let Some(json) = &args.json {
        let parsed = serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return json_to_value(&parsed);
    }
    Err(CliError::new(USAGE, "no value given"))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    let (number, to_duration): (&str, fn(u64) -> Duration) =
        if let Some(num) = input.strip_suffix("ms") {
            (num, Duration::from_millis)
        } else if let Some(num) = input.strip_suffix('s') {
            (num, Duration::from_secs)
        } else {
            (input, Duration::from_secs)
        };

    match number.parse::<u64>() {
        Ok(0) => Err(CliError::new(USAGE, "duration must be greater than zero")),
        Ok(value) => Ok(to_duration(value)),
        Err(_) => Err(CliError::new(
            USAGE,
            format!("invalid duration value: {input:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;

    fn args() -> SendArgs {
        SendArgs {
            addr: "127.0.0.1:1".into(),
            text: None,
            int: None,
            sint: None,
            float: None,
            flag: None,
            json: None,
            wait: false,
            wait_timeout: "5s".into(),
        }
    }

    #[test]
    fn resolves_each_value_flag() {
        let text = SendArgs {
            text: Some("hi".into()),
            ..args()
        };
        assert_eq!(resolve_value(&text).unwrap(), Value::from("hi"));

        let int = SendArgs {
            int: Some(678_900_786),
            ..args()
        };
        assert_eq!(resolve_value(&int).unwrap(), Value::Int(678_900_786));

        let sint = SendArgs {
            sint: Some(-56),
            ..args()
        };
        assert_eq!(resolve_value(&sint).unwrap(), Value::SignedInt(-56));

        let json = SendArgs {
            json: Some(r#"["hjk", 23, 34.7]"#.into()),
            ..args()
        };
        assert_eq!(
            resolve_value(&json).unwrap(),
            Value::from(vec![Value::from("hjk"), Value::Int(23), Value::Float(34.7)])
        );
    }

    #[test]
    fn negative_int_is_data_invalid() {
        let negative = SendArgs {
            int: Some(-5),
            ..args()
        };
        assert_eq!(resolve_value(&negative).unwrap_err().code, DATA_INVALID);
    }

    #[test]
    fn malformed_json_is_usage_error() {
        let bad = SendArgs {
            json: Some("[1,".into()),
            ..args()
        };
        assert_eq!(resolve_value(&bad).unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
