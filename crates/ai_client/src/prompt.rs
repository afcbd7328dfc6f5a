//! Prompt for turning a natural-language question into pandas code over the
//! trial-balance sheet.

/// What the model is told about the data it writes code against.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// File name the executed code loads; only mentioned in the prompt.
    pub workbook_name: String,
    /// 0-based header row passed to `pd.read_excel`.
    pub header_row: usize,
    pub columns: Vec<String>,
    /// Column name paired with a few representative values.
    pub samples: Vec<(String, Vec<String>)>,
}

impl Default for QueryContext {
    fn default() -> Self {
        let columns = [
            "GL",
            "GL Name",
            "Gr GL",
            "Gr GL Name",
            "Amount",
            "FS Grouping Main Head",
            "FS Grouping Main Sub Head",
        ];
        let samples = vec![
            ("GL", vec!["11100110", "11100200", "11100400", "11200010"]),
            (
                "GL Name",
                vec![
                    "\"Inventory-Raw Material-Domestic\"",
                    "\"Capital Inventory-Domestic\"",
                    "\"Inventory-Stores & Spares-Domestic\"",
                    "\"Business Partner-Loan\"",
                ],
            ),
            (
                "FS Grouping Main Head",
                vec![
                    "\"Non-Current Assets\"",
                    "\"Current Assets\"",
                    "\"Current Liabilities\"",
                ],
            ),
            (
                "FS Grouping Main Sub Head",
                vec![
                    "\"Capital work-in-progress\"",
                    "\"Inventories\"",
                    "\"Financial Liabilities - Other financial liabilities\"",
                ],
            ),
        ];

        Self {
            workbook_name: "Trial_Balance.xlsx".to_string(),
            header_row: 2,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            samples: samples
                .into_iter()
                .map(|(c, v)| (c.to_string(), v.into_iter().map(str::to_string).collect()))
                .collect(),
        }
    }
}

pub fn build_query_system_prompt(ctx: &QueryContext) -> String {
    let columns = format!("[{}]", ctx.columns.join(", "));
    let samples: String = ctx
        .samples
        .iter()
        .map(|(col, values)| format!("- `{}`: [{}]\n", col, values.join(", ")))
        .collect();

    format!(
        r#"You are an expert Python Pandas code assistant.
A pandas DataFrame named `data` has already been loaded from the Excel file '{workbook}' using pd.read_excel(..., header={header}, usecols="A:G").

The DataFrame has the following columns:
{columns}

---
Here are some examples of the data in each column to help you verify:
{samples}---

Your task is to generate *ONLY* the single block of Python code needed to answer the user's question.
- The code *MUST* include a `print()` statement to display the final result.

**RULES:**
1.  **CONTEXT AWARENESS:** You *MUST* use the data examples above to decide which column to filter. For example, if the user asks for "Current Assets", you know to filter the `FS Grouping Main Head` column. If they ask for "Inventories", you filter the `FS Grouping Main Sub Head` column.
2.  **SINGLE VALUE:** If the result is a single value (e.g., one number, one name), use `.values[0]` or `.iloc[0]` to print **only the value** itself, not the index or dtype. If the filter might be empty, you must first check if the dataframe is empty before getting the value.
3.  **CASE-INSENSITIVE:** When filtering on text columns (like `GL Name` or `FS Grouping Main Head`), always use `.str.lower()` on the DataFrame column to make the comparison case-insensitive.
4.  **FULL DATAFRAME:** If the result is multiple rows, print the full DataFrame.
5.  **NO MARKDOWN:** Do NOT include markdown (like ```python) or any explanation.
6.  **NO LOAD CODE:** Do NOT include the code to load the data; it is already loaded.

---
Example Request 1 (Single Value):
what is the amount of gl 11100110

Example Response 1:
print(data[data['GL'] == 11100110]['Amount'].values[0])

Example Request 2 (Context + Case-Insensitive):
show me all current assets

Example Response 2:
print(data[data['FS Grouping Main Head'].str.lower() == 'current assets'])

Example Request 3 (Context + Case-Insensitive + Single Value):
give me the first gl id in which there will be the first current assets occuring

Example Response 3:
df_filtered = data[data['FS Grouping Main Head'].str.lower() == 'current assets']
if not df_filtered.empty:
    print(df_filtered['GL'].iloc[0])
else:
    print("No matching 'Current Assets' found.")
"#,
        workbook = ctx.workbook_name,
        header = ctx.header_row,
        columns = columns,
        samples = samples,
    )
}

/// Removes markdown code fences (```` ```python ```` / ```` ``` ````) the model
/// adds despite being told not to.
pub fn strip_code_fences(answer: &str) -> String {
    answer
        .replace("```python", "")
        .replace("```py", "")
        .replace("```", "")
        .trim()
        .to_string()
}
