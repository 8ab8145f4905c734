use crate::models::{Author, Ingredient, RecipeDetails};

/// The nine numbered entries of the main menu, in display order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum MenuAction {
    AddAuthor,
    AddRecipe,
    AddIngredient,
    ListRecipes,
    ListAuthors,
    ListIngredients,
    DeleteRecipe,
    DeleteAuthor,
    Quit,
}

impl MenuAction {
    pub(crate) const ALL: [MenuAction; 9] = [
        MenuAction::AddAuthor,
        MenuAction::AddRecipe,
        MenuAction::AddIngredient,
        MenuAction::ListRecipes,
        MenuAction::ListAuthors,
        MenuAction::ListIngredients,
        MenuAction::DeleteRecipe,
        MenuAction::DeleteAuthor,
        MenuAction::Quit,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            MenuAction::AddAuthor => "Add an author",
            MenuAction::AddRecipe => "Add a recipe",
            MenuAction::AddIngredient => "Add an ingredient",
            MenuAction::ListRecipes => "List recipes",
            MenuAction::ListAuthors => "List authors",
            MenuAction::ListIngredients => "List ingredients",
            MenuAction::DeleteRecipe => "Delete a recipe",
            MenuAction::DeleteAuthor => "Delete an author",
            MenuAction::Quit => "Quit",
        }
    }

    /// Menu number as shown to the user (1-based).
    pub(crate) fn number(self) -> usize {
        Self::ALL.iter().position(|a| *a == self).unwrap_or(0) + 1
    }

    /// Map a typed digit back to its action.
    pub(crate) fn from_digit(ch: char) -> Option<Self> {
        let n = ch.to_digit(10)? as usize;
        n.checked_sub(1).and_then(|idx| Self::ALL.get(idx).copied())
    }
}

/// Cursor over the main menu.
#[derive(Default)]
pub(crate) struct MenuScreen {
    pub(crate) selected: usize,
}

impl MenuScreen {
    pub(crate) fn move_selection(&mut self, delta: isize) {
        let len = MenuAction::ALL.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    pub(crate) fn current(&self) -> MenuAction {
        MenuAction::ALL[self.selected.min(MenuAction::ALL.len() - 1)]
    }
}

/// A scrollable list of loaded rows with a single selected entry.
pub(crate) struct ListScreen<T> {
    pub(crate) items: Vec<T>,
    pub(crate) selected: usize,
}

impl<T> ListScreen<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self { items, selected: 0 }
    }

    /// Swap in freshly loaded rows, keeping the cursor in range.
    pub(crate) fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    pub(crate) fn current(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.items.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }
}

pub(crate) type RecipeScreen = ListScreen<RecipeDetails>;
pub(crate) type AuthorScreen = ListScreen<Author>;
pub(crate) type IngredientScreen = ListScreen<Ingredient>;
