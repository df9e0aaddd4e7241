use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(body)) = (data, response.as_object_mut()) {
                body.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a collection as JSON, or one line per item in text mode
pub fn output_collection<T, F>(
    output_format: &OutputFormat,
    collection_name: &str,
    items: &[T],
    empty_message: &str,
    line: F,
) -> anyhow::Result<()>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ collection_name: items }))?
            );
        }
        OutputFormat::Text if items.is_empty() => println!("{}", empty_message),
        OutputFormat::Text => {
            for item in items {
                println!("{}", line(item));
            }
        }
    }
    Ok(())
}
