use crate::error::StoreError;
use crate::models::{Order, UserAccount};

/// The transportable backup document: every user record, pretty-printed.
pub fn users_json(users: &[UserAccount]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(users)?)
}

/// One row per order: id, user id, amount, status, created, updated, note.
pub fn orders_csv(orders: &[Order]) -> String {
    let mut out = String::from("id,user_id,amount,status,created_at,updated_at,note\n");
    for order in orders {
        let row = [
            order.id.clone(),
            order.user_id.to_string(),
            format!("{:.2}", order.amount),
            order.status.to_string(),
            order.created_at.to_rfc3339(),
            order.updated_at.to_rfc3339(),
            order.note.clone().unwrap_or_default(),
        ];
        let row: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn csv_has_header_and_one_row_per_order() {
        let now = Utc::now();
        let a = Order::new(1, 12.5, None, now);
        let b = Order::new(2, 99.0, Some("leave at door".into()), now);
        let csv = orders_csv(&[a.clone(), b.clone()]);

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,user_id,amount,status,created_at,updated_at,note");
        assert!(lines[1].starts_with(&format!("{},1,12.50,pending,", a.id)));
        assert!(lines[2].ends_with("leave at door"));
    }

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        let now = Utc::now();
        let order = Order::new(3, 5.0, Some("say \"hi\", please".into()), now);
        let csv = orders_csv(&[order]);
        assert!(csv.contains("\"say \"\"hi\"\", please\""));
    }

    #[test]
    fn users_json_round_trips() {
        let now = Utc::now();
        let users = vec![
            UserAccount::new(1, Some("a"), None, now),
            UserAccount::new(2, None, Some("B"), now),
        ];
        let doc = users_json(&users).unwrap();
        let parsed: Vec<UserAccount> = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].tg_id, 1);
    }
}
