//! Prompt text sent to the model.

/// Items that stay fresh longer than this are treated as shelf-stable.
pub const PERISHABLE_HORIZON_DAYS: u32 = 100;

/// Prompt for turning raw OCR text into a JSON array of food items.
pub fn build_receipt_prompt(user_id: &str, ocr_text: &str) -> String {
    let mut prompt = String::with_capacity(2048 + ocr_text.len());

    prompt.push_str(
        "SYSTEM_ROLE:\n\
         You read grocery store receipts. Extract every food item and estimate how long it \
         stays fresh, but only when it is perishable.\n\n",
    );
    prompt.push_str("USER_ID: ");
    prompt.push_str(user_id);
    prompt.push_str("\n\n");
    prompt.push_str(
        "TASK: Use the purchase date printed on the receipt as day zero. List each food or \
         beverage item under its simplest generic singular name.\n\n",
    );
    prompt.push_str(&format!(
        "An item is perishable when it spoils or loses freshness within {PERISHABLE_HORIZON_DAYS} \
         days of purchase. Shelf-stable items get no freshness estimate.\n\n"
    ));
    prompt.push_str(&output_format_section());
    prompt.push_str(
        "RULES:\n\
         - Do not output the purchase date.\n\
         - Skip household and other non-food products (soap, paper towels, detergent).\n\
         - Expand abbreviations before judging perishability.\n\
         - An item bought several times appears once per purchase.\n\
         - If nothing qualifies, return [].\n\
         - Return the JSON array only, with no commentary.\n\n",
    );
    prompt.push_str("RECEIPT_TEXT: ");
    prompt.push_str(ocr_text);
    prompt.push_str("\n\nJSON_OUTPUT:\n\n");
    prompt
}

/// Prompt for estimating freshness windows of already-known item names.
pub fn build_perishability_prompt(names: &[String]) -> String {
    let mut prompt = String::from(
        "SYSTEM_ROLE:\n\
         You estimate how long groceries stay fresh after purchase.\n\n\
         TASK: For each item name below, return one object with the same name.\n\n",
    );
    prompt.push_str(&output_format_section());
    prompt.push_str("ITEMS:\n");
    for name in names {
        prompt.push_str("- ");
        prompt.push_str(name);
        prompt.push('\n');
    }
    prompt.push_str("\nJSON_OUTPUT:\n\n");
    prompt
}

fn output_format_section() -> String {
    format!(
        "OUTPUT_FORMAT: a JSON array of objects.\n\
         - name (string, required): generic item name such as \"Milk\" or \"Peanut Butter\".\n\
         - min_days, max_days (integers): only for items that spoil within \
         {PERISHABLE_HORIZON_DAYS} days. Use the same number for both when the estimate is a \
         single value.\n\n\
         Example:\n\
         [\n  {{\"name\": \"Milk\", \"min_days\": 5, \"max_days\": 7}},\n  \
         {{\"name\": \"Apple\", \"min_days\": 14, \"max_days\": 21}},\n  \
         {{\"name\": \"Peanut Butter\"}}\n]\n\n"
    )
}
