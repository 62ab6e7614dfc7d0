/// Fixed analysis prompt. The reply format requested here is what
/// [`super::SafetyReport::from_reply`] scrapes.
pub fn build_prompt(ingredients: &str) -> String {
    format!(
        r#"
As an expert toxicologist and ingredient safety analyst, analyze the following ingredient list for potential health risks.

Ingredient List:
"{ingredients}"

Please provide a comprehensive analysis in the following format:

## Language Detection & Translation
First, identify the language of the ingredient list. If it's not in English, provide an accurate English translation prefixed with "Translation:".

## Ingredient Safety Analysis
Analyze each ingredient for potential health risks including:
- Carcinogens
- Neurotoxins
- Hormone disruptors
- Allergens
- Substances harmful when overused
- Any other safety concerns

For each concerning ingredient, explain:
- What it is and its purpose
- Why it's potentially harmful
- Scientific evidence/sources (mention specific studies or regulatory findings when possible)
- Groups at higher risk (children, pregnant women, etc.)

## Risk Assessment
Provide an overall risk level: LOW, MEDIUM, or HIGH based on:
- Number of concerning ingredients
- Severity of potential effects
- Concentration levels (if determinable)
- Cumulative effects
- Risk levels should be consistently displayed in the format "Risk Level: [LOW/MEDIUM/HIGH]"

## Usage Recommendations
Provide specific guidance on:
- Whether the product is safe for general use
- Any usage limitations or precautions
- Specific warnings for vulnerable populations
- Alternative product suggestions if applicable

Be thorough but clear, and base your analysis on current scientific understanding and regulatory guidelines from agencies like FDA, EPA, and international health organizations.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_and_requests_all_sections() {
        let p = build_prompt("Aqua, Parfum, Methylparaben");
        assert!(p.contains("\"Aqua, Parfum, Methylparaben\""));
        for header in [
            "## Language Detection & Translation",
            "## Ingredient Safety Analysis",
            "## Risk Assessment",
            "## Usage Recommendations",
        ] {
            assert!(p.contains(header), "missing {header}");
        }
        assert!(p.contains("Risk Level: [LOW/MEDIUM/HIGH]"));
    }
}
