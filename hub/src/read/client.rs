//! [`Client`]-related read definitions.

#[cfg(doc)]
use crate::domain::Client;

pub mod list {
    //! [`Client`]s list definitions.

    use crate::domain::Client;

    /// Filter of a [`Client`]s list.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Words to fuzzy search for in [`Client`] names.
        ///
        /// A [`Client`] matches if its name contains any of the words,
        /// case-insensitively.
        pub name: Option<String>,
    }

    impl Filter {
        /// Checks whether the provided [`Client`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, client: &Client) -> bool {
            let Some(search) = &self.name else {
                return true;
            };
            let name = AsRef::<str>::as_ref(&client.name).to_lowercase();
            let mut words = search.split_ascii_whitespace().peekable();
            words.peek().is_none()
                || words.any(|w| name.contains(&w.to_lowercase()))
        }
    }
}
