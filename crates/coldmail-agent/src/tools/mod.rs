//! Research tools and the prompt builder they share.

pub mod prompt;
pub mod research;

pub use prompt::{ToolPromptBuilder, extract_company_name};
pub use research::{
    COMPETITIVE_TOOL, LINKEDIN_TOOL, LinkedInAugmenter, NEWS_TOOL, NewsAugmenter, WEBSITE_TOOL,
    WebsiteAugmenter, competitive_tool, linkedin_tool, news_tool, website_tool,
};
