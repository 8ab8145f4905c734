use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{
    parse_integer, require_text, Author, Ingredient, NewAuthor, NewIngredient, NewRecipe, Recipe,
    ValidationError,
};

/// A field of one of the input forms. `label` doubles as the field name that
/// validation errors carry, which is how a rejected value gets refocused.
pub(crate) trait FormField: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    /// Extra text rendered after the label, e.g. units or allowed range.
    fn hint(self) -> Option<&'static str> {
        None
    }

    fn optional(self) -> bool {
        false
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum AuthorField {
    Name,
    Email,
    Bio,
}

impl FormField for AuthorField {
    const ALL: &'static [Self] = &[AuthorField::Name, AuthorField::Email, AuthorField::Bio];

    fn label(self) -> &'static str {
        match self {
            AuthorField::Name => "Name",
            AuthorField::Email => "Email",
            AuthorField::Bio => "Bio",
        }
    }

    fn optional(self) -> bool {
        !matches!(self, AuthorField::Name)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum RecipeField {
    Title,
    Description,
    Instructions,
    PrepMinutes,
    CookMinutes,
    AuthorId,
}

impl FormField for RecipeField {
    const ALL: &'static [Self] = &[
        RecipeField::Title,
        RecipeField::Description,
        RecipeField::Instructions,
        RecipeField::PrepMinutes,
        RecipeField::CookMinutes,
        RecipeField::AuthorId,
    ];

    fn label(self) -> &'static str {
        match self {
            RecipeField::Title => "Title",
            RecipeField::Description => "Description",
            RecipeField::Instructions => "Instructions",
            RecipeField::PrepMinutes => "Prep time",
            RecipeField::CookMinutes => "Cook time",
            RecipeField::AuthorId => "Author id",
        }
    }

    fn hint(self) -> Option<&'static str> {
        match self {
            RecipeField::PrepMinutes | RecipeField::CookMinutes => Some("minutes"),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum IngredientField {
    Name,
    HealthScore,
}

impl FormField for IngredientField {
    const ALL: &'static [Self] = &[IngredientField::Name, IngredientField::HealthScore];

    fn label(self) -> &'static str {
        match self {
            IngredientField::Name => "Name",
            IngredientField::HealthScore => "Health score",
        }
    }

    fn hint(self) -> Option<&'static str> {
        match self {
            IngredientField::HealthScore => Some("1 to 5"),
            IngredientField::Name => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum AttachField {
    IngredientId,
    Quantity,
}

impl FormField for AttachField {
    const ALL: &'static [Self] = &[AttachField::IngredientId, AttachField::Quantity];

    fn label(self) -> &'static str {
        match self {
            AttachField::IngredientId => "Ingredient id",
            AttachField::Quantity => "Quantity",
        }
    }

    fn hint(self) -> Option<&'static str> {
        match self {
            AttachField::Quantity => Some("e.g. 2 cups"),
            AttachField::IngredientId => None,
        }
    }
}

/// Single-field prompt used by the delete-by-id menu actions.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum IdField {
    Id,
}

impl FormField for IdField {
    const ALL: &'static [Self] = &[IdField::Id];

    fn label(self) -> &'static str {
        "Id"
    }
}

/// Text buffers for every field of `F`, the focused field, and the last
/// validation message.
#[derive(Clone, Debug)]
pub(crate) struct Form<F: FormField> {
    values: Vec<String>,
    pub(crate) active: F,
    pub(crate) error: Option<String>,
}

impl<F: FormField> Default for Form<F> {
    fn default() -> Self {
        Self {
            values: vec![String::new(); F::ALL.len()],
            active: F::ALL[0],
            error: None,
        }
    }
}

impl<F: FormField> Form<F> {
    fn index(field: F) -> usize {
        F::ALL.iter().position(|f| *f == field).unwrap_or(0)
    }

    pub(crate) fn value(&self, field: F) -> &str {
        &self.values[Self::index(field)]
    }

    #[cfg(test)]
    pub(crate) fn set_value(&mut self, field: F, value: impl Into<String>) {
        self.values[Self::index(field)] = value.into();
    }

    pub(crate) fn focus(&mut self, field: F) {
        self.active = field;
    }

    /// Move focus forward, wrapping from the last field to the first.
    pub(crate) fn next_field(&mut self) {
        let next = (Self::index(self.active) + 1) % F::ALL.len();
        self.active = F::ALL[next];
    }

    pub(crate) fn prev_field(&mut self) {
        let len = F::ALL.len();
        let prev = (Self::index(self.active) + len - 1) % len;
        self.active = F::ALL[prev];
    }

    /// Append a character to the active field. Control characters are ignored.
    /// Numeric fields accept any printable text on purpose: the value is
    /// judged as a whole on submit so "-5" gets a precise message.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let idx = Self::index(self.active);
        self.values[idx].push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        let idx = Self::index(self.active);
        self.values[idx].pop();
    }

    /// Record a validation failure and put the cursor back on the field that
    /// caused it.
    pub(crate) fn reject(&mut self, err: &ValidationError) {
        if let Some(field) = F::ALL.iter().copied().find(|f| f.label() == err.field()) {
            self.focus(field);
        }
        self.error = Some(err.to_string());
    }

    /// Same as [`Form::reject`] for misses that are not validation errors.
    pub(crate) fn reject_field(&mut self, field: F, message: impl Into<String>) {
        self.focus(field);
        self.error = Some(message.into());
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: F) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            if field.optional() {
                "<optional>".to_string()
            } else {
                "<required>".to_string()
            }
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(Self::prefix(field)),
            Span::styled(display, style),
        ])
    }

    /// `"Prep time (minutes): "`, everything that precedes the value.
    pub(crate) fn prefix(field: F) -> String {
        match field.hint() {
            Some(hint) => format!("{} ({hint}): ", field.label()),
            None => format!("{}: ", field.label()),
        }
    }

    /// Lines for every field followed by the error message, if any.
    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = F::ALL.iter().map(|f| self.build_line(*f)).collect();
        if let Some(error) = &self.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        lines
    }

    /// Row and column of the text cursor relative to the form's inner area.
    pub(crate) fn cursor_offset(&self) -> (u16, u16) {
        let row = Self::index(self.active);
        let col = Self::prefix(self.active).chars().count()
            + self.value(self.active).chars().count();
        (
            u16::try_from(col).unwrap_or(u16::MAX),
            u16::try_from(row).unwrap_or(u16::MAX),
        )
    }
}

impl Form<AuthorField> {
    pub(crate) fn parse_inputs(&self) -> Result<NewAuthor, ValidationError> {
        NewAuthor::new(
            self.value(AuthorField::Name),
            self.value(AuthorField::Email),
            self.value(AuthorField::Bio),
        )
    }
}

impl Form<RecipeField> {
    pub(crate) fn parse_inputs(&self) -> Result<NewRecipe, ValidationError> {
        NewRecipe::new(
            self.value(RecipeField::Title),
            self.value(RecipeField::Description),
            self.value(RecipeField::Instructions),
            self.value(RecipeField::PrepMinutes),
            self.value(RecipeField::CookMinutes),
            self.value(RecipeField::AuthorId),
        )
    }
}

impl Form<IngredientField> {
    pub(crate) fn parse_inputs(&self) -> Result<NewIngredient, ValidationError> {
        NewIngredient::new(
            self.value(IngredientField::Name),
            self.value(IngredientField::HealthScore),
        )
    }
}

impl Form<AttachField> {
    /// Validated `(ingredient_id, quantity)`.
    pub(crate) fn parse_inputs(&self) -> Result<(i64, String), ValidationError> {
        let ingredient_id = parse_integer("Ingredient id", self.value(AttachField::IngredientId))?;
        let quantity = require_text("Quantity", self.value(AttachField::Quantity))?;
        Ok((ingredient_id, quantity))
    }
}

impl Form<IdField> {
    pub(crate) fn parse_inputs(&self) -> Result<i64, ValidationError> {
        parse_integer("Id", self.value(IdField::Id))
    }
}

/// State carried through the "attach ingredients" loop for one recipe.
#[derive(Clone, Debug)]
pub(crate) struct AttachState {
    pub(crate) recipe_id: i64,
    pub(crate) recipe_title: String,
    pub(crate) form: Form<AttachField>,
    /// Links added so far in this loop, used to word the follow-up prompt.
    pub(crate) attached: usize,
}

impl AttachState {
    pub(crate) fn for_recipe(recipe: &Recipe) -> Self {
        Self {
            recipe_id: recipe.id,
            recipe_title: recipe.title.clone(),
            form: Form::default(),
            attached: 0,
        }
    }

    /// Fresh form for the next iteration, keeping the running count.
    pub(crate) fn next_round(self) -> Self {
        Self {
            form: Form::default(),
            ..self
        }
    }
}

/// What a delete-by-id is aimed at. The menu only prompts for recipes and
/// authors; ingredients are deleted from their list screen.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum DeleteTarget {
    Recipe,
    Author,
    Ingredient,
}

impl DeleteTarget {
    pub(crate) fn noun(self) -> &'static str {
        match self {
            DeleteTarget::Recipe => "recipe",
            DeleteTarget::Author => "author",
            DeleteTarget::Ingredient => "ingredient",
        }
    }
}

/// A delete picked from one of the list screens, waiting for y/n.
#[derive(Clone, Debug)]
pub(crate) enum ConfirmDelete {
    Recipe(Recipe),
    Author { author: Author, recipes: usize },
    Ingredient(Ingredient),
}

impl ConfirmDelete {
    /// Target and id the confirmed delete is keyed by.
    pub(crate) fn key(&self) -> (DeleteTarget, i64) {
        match self {
            ConfirmDelete::Recipe(recipe) => (DeleteTarget::Recipe, recipe.id),
            ConfirmDelete::Author { author, .. } => (DeleteTarget::Author, author.id),
            ConfirmDelete::Ingredient(ingredient) => (DeleteTarget::Ingredient, ingredient.id),
        }
    }

    pub(crate) fn question(&self) -> String {
        match self {
            ConfirmDelete::Recipe(recipe) => format!("Delete recipe {recipe}?"),
            ConfirmDelete::Author { author, recipes } if *recipes > 0 => format!(
                "Delete author {author}? Their {recipes} recipe(s) will be deleted too."
            ),
            ConfirmDelete::Author { author, .. } => format!("Delete author {author}?"),
            ConfirmDelete::Ingredient(ingredient) => format!(
                "Delete ingredient {ingredient}? It will be removed from every recipe."
            ),
        }
    }
}
