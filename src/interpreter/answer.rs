use crate::graph::{Block, BlockKind, ChoiceOption, FormField};
use crate::value::Value;
use std::collections::BTreeMap;

/// Checks an answer against the shape the block kind accepts.
///
/// Returns the value to store under the block's variable (`None` when the
/// block stores nothing) or a reason the answer was rejected.
pub fn accept_answer(block: &Block, answer: &Value) -> Result<Option<Value>, String> {
    match &block.kind {
        BlockKind::Message => Ok(None),
        BlockKind::TextInput { max_length } => {
            let text = non_empty_text(answer)?;
            match max_length {
                Some(limit) if text.chars().count() > *limit => Err(format!(
                    "answer is longer than {} characters",
                    limit
                )),
                _ => Ok(Some(Value::Text(text.to_string()))),
            }
        }
        BlockKind::NumberInput { min, max } => {
            let n = answer
                .as_number()
                .ok_or_else(|| format!("expected a finite number, got {}", answer))?;
            if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
                return Err(format!(
                    "{} is outside the allowed range [{}, {}]",
                    Value::Number(n),
                    bound(*min),
                    bound(*max)
                ));
            }
            Ok(Some(Value::Number(n)))
        }
        BlockKind::SingleChoice { options } | BlockKind::Scale { options } => {
            find_option(options, answer).map(|option| Some(option.value.clone()))
        }
        BlockKind::MultiChoice {
            options,
            max_selections,
        } => accept_selection(options, *max_selections, answer).map(Some),
        BlockKind::YesNo => answer
            .as_bool()
            .map(|b| Some(Value::Bool(b)))
            .ok_or_else(|| format!("expected yes or no, got {}", answer)),
        BlockKind::Video { .. } => non_empty_text(answer)
            .map(|reference| Some(Value::Text(reference.to_string())))
            .map_err(|_| "expected a reference to the recorded response".to_string()),
        BlockKind::ContactForm { fields } => {
            let record = accept_form(fields, answer)?;
            if let Some(email) = record.get("email").and_then(Value::as_text) {
                if !email.trim().is_empty() && !email.contains('@') {
                    return Err(format!("'{}' is not an email address", email));
                }
            }
            Ok(Some(Value::Record(record)))
        }
        BlockKind::Demographics { fields } => {
            accept_form(fields, answer).map(|record| Some(Value::Record(record)))
        }
        BlockKind::Final => Err("a final block accepts no answer".to_string()),
        BlockKind::Unrecognized { name } => {
            Err(format!("block kind '{}' cannot take answers", name))
        }
    }
}

fn non_empty_text(answer: &Value) -> Result<&str, String> {
    match answer.as_text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err("answer must not be empty".to_string()),
        None => Err(format!("expected text, got {}", answer)),
    }
}

fn bound(limit: Option<f64>) -> String {
    limit.map_or_else(|| "-".to_string(), |n| Value::Number(n).to_string())
}

/// Ids take precedence over values across the whole option list.
fn find_option<'a>(options: &'a [ChoiceOption], answer: &Value) -> Result<&'a ChoiceOption, String> {
    options
        .iter()
        .find(|option| option.has_id(answer))
        .or_else(|| options.iter().find(|option| option.has_value(answer)))
        .ok_or_else(|| format!("{} is not one of the block's options", answer))
}

fn accept_selection(
    options: &[ChoiceOption],
    max_selections: Option<usize>,
    answer: &Value,
) -> Result<Value, String> {
    let Value::List(items) = answer else {
        return Err(format!("expected a list of options, got {}", answer));
    };
    if items.is_empty() {
        return Err("select at least one option".to_string());
    }
    if let Some(limit) = max_selections.filter(|limit| items.len() > *limit) {
        return Err(format!("select at most {} options", limit));
    }

    let mut chosen: Vec<&ChoiceOption> = Vec::with_capacity(items.len());
    for item in items {
        let option = find_option(options, item)?;
        if chosen.iter().any(|c| c.id == option.id) {
            return Err(format!("option '{}' was selected twice", option.id));
        }
        chosen.push(option);
    }
    Ok(Value::List(
        chosen.into_iter().map(|option| option.value.clone()).collect(),
    ))
}

fn accept_form(fields: &[FormField], answer: &Value) -> Result<BTreeMap<String, Value>, String> {
    let Value::Record(record) = answer else {
        return Err(format!("expected an object of form fields, got {}", answer));
    };
    let missing: Vec<&str> = fields
        .iter()
        .filter(|field| field.required && record.get(&field.id).is_none_or(is_blank))
        .map(|field| field.id.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(format!("missing required field(s): {}", missing.join(", ")));
    }
    Ok(record.clone())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}
