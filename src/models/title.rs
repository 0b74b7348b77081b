use serde::{Deserialize, Serialize};

/// A title as reported by a parser during sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTitle {
    pub id_on_website: String,
    pub name: String,
    #[serde(default)]
    pub en_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Reference to the same anime on another parser, used to link titles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkParsedTitle {
    pub parser_id: String,
    pub id_on_website: String,
    pub name: String,
}

/// Fields needed to insert a title row.
#[derive(Debug, Clone)]
pub struct NewTitle {
    pub id_on_website: String,
    pub name: String,
    pub en_name: Option<String>,
    pub image_url: Option<String>,
}

impl From<&ParsedTitle> for NewTitle {
    fn from(title: &ParsedTitle) -> Self {
        Self {
            id_on_website: title.id_on_website.clone(),
            name: title.name.clone(),
            en_name: title.en_name.clone(),
            image_url: title.image_url.clone(),
        }
    }
}

impl From<&LinkParsedTitle> for NewTitle {
    fn from(title: &LinkParsedTitle) -> Self {
        Self {
            id_on_website: title.id_on_website.clone(),
            name: title.name.clone(),
            en_name: None,
            image_url: None,
        }
    }
}
