use anyhow::{Result, anyhow};

const QUESTION_PLACEHOLDER: &str = "{question}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        if !template.contains(QUESTION_PLACEHOLDER) {
            return Err(anyhow!(
                "Prompt template is missing the required '{}' placeholder: {:?}",
                QUESTION_PLACEHOLDER,
                template
            ));
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    pub fn render(&self, question: &str) -> String {
        self.template.replace(QUESTION_PLACEHOLDER, question)
    }
}
