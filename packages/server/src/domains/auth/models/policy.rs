use serde::Serialize;

/// Which usernames sign-up accepts. Lengths count characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsernamePolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub blacklist: Vec<String>,
}

impl Default for UsernamePolicy {
    fn default() -> Self {
        Self {
            min_length: 0,
            max_length: 20,
            blacklist: Vec::new(),
        }
    }
}

impl UsernamePolicy {
    pub fn allows(&self, username: &str) -> bool {
        let length = username.chars().count();
        length >= self.min_length
            && length <= self.max_length
            && !self.blacklist.iter().any(|banned| banned == username)
    }
}
