use crate::http::ApiMethod;

/// API resources and the methods each one accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Objects,
    Properties,
    Units,
    PropertyCategories,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Objects => "objects",
            Resource::Properties => "properties",
            Resource::Units => "units",
            Resource::PropertyCategories => "properties-categories",
        }
    }

    pub fn allowed_methods(&self) -> &'static [ApiMethod] {
        match self {
            Resource::Objects => &[ApiMethod::Get, ApiMethod::Post, ApiMethod::Patch, ApiMethod::Put],
            Resource::Properties | Resource::Units | Resource::PropertyCategories => {
                &[ApiMethod::Get, ApiMethod::Post]
            },
        }
    }

    pub fn allows(&self, method: ApiMethod) -> bool {
        self.allowed_methods().contains(&method)
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
