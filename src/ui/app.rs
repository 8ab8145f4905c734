use std::mem;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::error;

use crate::db::{
    attach_ingredient, count_recipes_by_author, create_author, create_ingredient, create_recipe,
    delete_author, delete_ingredient, delete_recipe, fetch_authors, fetch_ingredients,
    fetch_recipe_details, AttachOutcome, ConnectionProvider,
};
use crate::models::{Author, Ingredient, Recipe, RecipeDetails};

use super::forms::{
    AttachField, AttachState, AuthorField, ConfirmDelete, DeleteTarget, Form, FormField, IdField,
    IngredientField, RecipeField,
};
use super::helpers::{centered_rect, format_minutes, surface_error};
use super::screens::{
    AuthorScreen, IngredientScreen, ListScreen, MenuAction, MenuScreen, RecipeScreen,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// High-level navigation states. Keeping this explicit makes it easy to reason
/// about which rendering path runs and what keyboard shortcuts should do.
enum Screen {
    Menu(MenuScreen),
    Recipes(RecipeScreen),
    Authors(AuthorScreen),
    Ingredients(IngredientScreen),
}

/// Fine-grained modes layered over the current screen. Every input form lives
/// here until it validates, which is what "re-prompting" means in this UI.
enum Mode {
    Normal,
    AddingAuthor(Form<AuthorField>),
    AddingRecipe(Form<RecipeField>),
    AddingIngredient(Form<IngredientField>),
    Attaching(AttachState),
    ConfirmAttachAnother(AttachState),
    DeletingById {
        target: DeleteTarget,
        form: Form<IdField>,
    },
    ConfirmDelete(ConfirmDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer. `Warning` is for normal negative
/// outcomes such as an id that matched nothing.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum StatusKind {
    Info,
    Warning,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. The app owns the
/// connection provider for its whole lifetime and hands it back through
/// [`App::shutdown`].
pub struct App {
    db: ConnectionProvider,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(db: ConnectionProvider) -> Self {
        Self {
            db,
            screen: Screen::Menu(MenuScreen::default()),
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Release the database connection. Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<()> {
        self.db.close().context("failed to close the database")
    }

    /// Feed one key press through the state machine. Returns `true` once the
    /// user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingAuthor(form) => self.handle_add_author(code, form),
            Mode::AddingRecipe(form) => self.handle_add_recipe(code, form),
            Mode::AddingIngredient(form) => self.handle_add_ingredient(code, form),
            Mode::Attaching(state) => self.handle_attach(code, state),
            Mode::ConfirmAttachAnother(state) => self.handle_confirm_attach(code, state),
            Mode::DeletingById { target, form } => self.handle_delete_by_id(code, target, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        if let Screen::Menu(ref mut menu) = self.screen {
            let action = match code {
                KeyCode::Char('q') | KeyCode::Esc => Some(MenuAction::Quit),
                KeyCode::Up => {
                    menu.move_selection(-1);
                    None
                }
                KeyCode::Down => {
                    menu.move_selection(1);
                    None
                }
                KeyCode::Enter => Some(menu.current()),
                KeyCode::Char(ch) => MenuAction::from_digit(ch),
                _ => None,
            };
            return match action {
                Some(action) => self.run_menu_action(action, exit),
                None => Mode::Normal,
            };
        }

        match code {
            KeyCode::Char('q') => {
                *exit = true;
                Mode::Normal
            }
            KeyCode::Esc => {
                self.clear_status();
                self.screen = Screen::Menu(MenuScreen::default());
                Mode::Normal
            }
            KeyCode::Char('-') => self.confirm_delete_selected(),
            KeyCode::Char('+') => self.attach_to_selected(),
            _ => {
                match &mut self.screen {
                    Screen::Recipes(list) => navigate(list, code),
                    Screen::Authors(list) => navigate(list, code),
                    Screen::Ingredients(list) => navigate(list, code),
                    Screen::Menu(_) => {}
                }
                Mode::Normal
            }
        }
    }

    fn run_menu_action(&mut self, action: MenuAction, exit: &mut bool) -> Mode {
        self.clear_status();
        match action {
            MenuAction::AddAuthor => Mode::AddingAuthor(Form::default()),
            MenuAction::AddRecipe => Mode::AddingRecipe(Form::default()),
            MenuAction::AddIngredient => Mode::AddingIngredient(Form::default()),
            MenuAction::ListRecipes => {
                match self.with_conn(|conn| fetch_recipe_details(conn)) {
                    Ok(items) => self.screen = Screen::Recipes(ListScreen::new(items)),
                    Err(err) => self.report_failure("list recipes", &err),
                }
                Mode::Normal
            }
            MenuAction::ListAuthors => {
                match self.with_conn(|conn| fetch_authors(conn)) {
                    Ok(items) => self.screen = Screen::Authors(ListScreen::new(items)),
                    Err(err) => self.report_failure("list authors", &err),
                }
                Mode::Normal
            }
            MenuAction::ListIngredients => {
                match self.with_conn(|conn| fetch_ingredients(conn)) {
                    Ok(items) => self.screen = Screen::Ingredients(ListScreen::new(items)),
                    Err(err) => self.report_failure("list ingredients", &err),
                }
                Mode::Normal
            }
            MenuAction::DeleteRecipe => Mode::DeletingById {
                target: DeleteTarget::Recipe,
                form: Form::default(),
            },
            MenuAction::DeleteAuthor => Mode::DeletingById {
                target: DeleteTarget::Author,
                form: Form::default(),
            },
            MenuAction::Quit => {
                *exit = true;
                Mode::Normal
            }
        }
    }

    fn handle_add_author(&mut self, code: KeyCode, mut form: Form<AuthorField>) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add author cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter => match form.parse_inputs() {
                Err(err) => {
                    form.reject(&err);
                    Mode::AddingAuthor(form)
                }
                Ok(author) => {
                    match self.with_conn(|conn| create_author(conn, &author)) {
                        Ok(created) => {
                            self.set_status(format!("Added author {created}."), StatusKind::Info);
                            self.refresh_screen();
                        }
                        Err(err) => self.report_failure("add the author", &err),
                    }
                    Mode::Normal
                }
            },
            _ => {
                edit_form(&mut form, code);
                Mode::AddingAuthor(form)
            }
        }
    }

    fn handle_add_recipe(&mut self, code: KeyCode, mut form: Form<RecipeField>) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add recipe cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter => match form.parse_inputs() {
                Err(err) => {
                    form.reject(&err);
                    Mode::AddingRecipe(form)
                }
                Ok(recipe) => match self.with_conn(|conn| create_recipe(conn, &recipe)) {
                    Ok(created) => {
                        self.set_status(format!("Added recipe {created}."), StatusKind::Info);
                        self.refresh_screen();
                        Mode::ConfirmAttachAnother(AttachState::for_recipe(&created))
                    }
                    Err(err) => {
                        self.report_failure("add the recipe", &err);
                        Mode::Normal
                    }
                },
            },
            _ => {
                edit_form(&mut form, code);
                Mode::AddingRecipe(form)
            }
        }
    }

    fn handle_add_ingredient(&mut self, code: KeyCode, mut form: Form<IngredientField>) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add ingredient cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter => match form.parse_inputs() {
                Err(err) => {
                    form.reject(&err);
                    Mode::AddingIngredient(form)
                }
                Ok(ingredient) => {
                    match self.with_conn(|conn| create_ingredient(conn, &ingredient)) {
                        Ok(created) => {
                            self.set_status(
                                format!("Added ingredient {created}."),
                                StatusKind::Info,
                            );
                            self.refresh_screen();
                        }
                        Err(err) => self.report_failure("add the ingredient", &err),
                    }
                    Mode::Normal
                }
            },
            _ => {
                edit_form(&mut form, code);
                Mode::AddingIngredient(form)
            }
        }
    }

    /// One iteration of the attach loop. An unknown ingredient id keeps the
    /// prompt open; only a storage failure ends the loop early.
    fn handle_attach(&mut self, code: KeyCode, mut state: AttachState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.finish_attach(&state);
                Mode::Normal
            }
            KeyCode::Enter => match state.form.parse_inputs() {
                Err(err) => {
                    state.form.reject(&err);
                    Mode::Attaching(state)
                }
                Ok((ingredient_id, quantity)) => {
                    let recipe_id = state.recipe_id;
                    let outcome = self.with_conn(|conn| {
                        attach_ingredient(conn, recipe_id, ingredient_id, &quantity)
                    });
                    match outcome {
                        Ok(AttachOutcome::Attached) => {
                            state.attached += 1;
                            self.set_status(
                                format!(
                                    "Added {quantity} of ingredient #{ingredient_id} to {}.",
                                    state.recipe_title
                                ),
                                StatusKind::Info,
                            );
                            self.refresh_screen();
                            Mode::ConfirmAttachAnother(state.next_round())
                        }
                        Ok(AttachOutcome::IngredientNotFound) => {
                            let message = format!("No ingredient with id {ingredient_id}.");
                            state
                                .form
                                .reject_field(AttachField::IngredientId, message.clone());
                            self.set_status(message, StatusKind::Warning);
                            Mode::Attaching(state)
                        }
                        Err(err) => {
                            self.report_failure("attach the ingredient", &err);
                            self.refresh_screen();
                            Mode::Normal
                        }
                    }
                }
            },
            _ => {
                edit_form(&mut state.form, code);
                Mode::Attaching(state)
            }
        }
    }

    fn handle_confirm_attach(&mut self, code: KeyCode, state: AttachState) -> Mode {
        match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => Mode::Attaching(state),
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.finish_attach(&state);
                Mode::Normal
            }
            _ => Mode::ConfirmAttachAnother(state),
        }
    }

    fn finish_attach(&mut self, state: &AttachState) {
        if state.attached > 0 {
            self.set_status(
                format!(
                    "Added {} ingredient(s) to {}.",
                    state.attached, state.recipe_title
                ),
                StatusKind::Info,
            );
        } else if self.status.is_none() {
            self.set_status("No ingredients added.", StatusKind::Info);
        }
    }

    fn handle_delete_by_id(
        &mut self,
        code: KeyCode,
        target: DeleteTarget,
        mut form: Form<IdField>,
    ) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter => match form.parse_inputs() {
                Err(err) => {
                    form.reject(&err);
                    Mode::DeletingById { target, form }
                }
                Ok(id) => {
                    self.delete_by_id(target, id);
                    Mode::Normal
                }
            },
            _ => {
                edit_form(&mut form, code);
                Mode::DeletingById { target, form }
            }
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let (target, id) = confirm.key();
                self.delete_by_id(target, id);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    /// Look the entity up, delete it, and report what went away. An id that
    /// matches nothing is reported as a warning, not a failure.
    fn delete_by_id(&mut self, target: DeleteTarget, id: i64) {
        let result = match target {
            DeleteTarget::Recipe => {
                self.with_conn(|conn| delete_recipe(conn, id)).map(|removed| {
                    removed.map(|recipe| format!("Deleted recipe {}.", describe_recipe(&recipe)))
                })
            }
            DeleteTarget::Author => self
                .with_conn(|conn| {
                    let recipes = count_recipes_by_author(conn, id)?;
                    Ok(delete_author(conn, id)?.map(|author| (author, recipes)))
                })
                .map(|removed| {
                    removed.map(|(author, recipes)| {
                        format!(
                            "Deleted author {} and {recipes} recipe(s).",
                            describe_author(&author)
                        )
                    })
                }),
            DeleteTarget::Ingredient => {
                self.with_conn(|conn| delete_ingredient(conn, id)).map(|removed| {
                    removed.map(|ingredient| format!("Deleted ingredient {ingredient}."))
                })
            }
        };

        match result {
            Ok(Some(message)) => self.set_status(message, StatusKind::Info),
            Ok(None) => self.set_status(
                format!("No {} with id {id}.", target.noun()),
                StatusKind::Warning,
            ),
            Err(err) => self.report_failure(&format!("delete the {}", target.noun()), &err),
        }
        self.refresh_screen();
    }

    fn confirm_delete_selected(&mut self) -> Mode {
        let pending = match &self.screen {
            Screen::Recipes(list) => list
                .current()
                .map(|details| ConfirmDelete::Recipe(details.recipe.clone())),
            Screen::Authors(list) => list.current().cloned().map(|author| ConfirmDelete::Author {
                author,
                recipes: 0,
            }),
            Screen::Ingredients(list) => list.current().cloned().map(ConfirmDelete::Ingredient),
            Screen::Menu(_) => return Mode::Normal,
        };

        let Some(mut pending) = pending else {
            self.set_status("Nothing selected to delete.", StatusKind::Warning);
            return Mode::Normal;
        };

        if let ConfirmDelete::Author { author, recipes } = &mut pending {
            let author_id = author.id;
            match self.with_conn(|conn| count_recipes_by_author(conn, author_id)) {
                Ok(count) => *recipes = count,
                Err(err) => {
                    self.report_failure("count the author's recipes", &err);
                    return Mode::Normal;
                }
            }
        }

        self.clear_status();
        Mode::ConfirmDelete(pending)
    }

    fn attach_to_selected(&mut self) -> Mode {
        let Screen::Recipes(list) = &self.screen else {
            return Mode::Normal;
        };
        match list.current() {
            Some(details) => {
                let state = AttachState::for_recipe(&details.recipe);
                self.clear_status();
                Mode::Attaching(state)
            }
            None => {
                self.set_status("No recipe selected.", StatusKind::Warning);
                Mode::Normal
            }
        }
    }

    /// Reload whatever list is on screen so it reflects the latest writes.
    fn refresh_screen(&mut self) {
        let result = match self.screen {
            Screen::Menu(_) => return,
            Screen::Recipes(_) => self.with_conn(|conn| fetch_recipe_details(conn)).map(|items| {
                if let Screen::Recipes(list) = &mut self.screen {
                    list.replace(items);
                }
            }),
            Screen::Authors(_) => self.with_conn(|conn| fetch_authors(conn)).map(|items| {
                if let Screen::Authors(list) = &mut self.screen {
                    list.replace(items);
                }
            }),
            Screen::Ingredients(_) => self.with_conn(|conn| fetch_ingredients(conn)).map(|items| {
                if let Screen::Ingredients(list) = &mut self.screen {
                    list.replace(items);
                }
            }),
        };

        if let Err(err) = result {
            self.report_failure("refresh the list", &err);
        }
    }

    /// Run one storage operation on the shared connection, opening it again if
    /// it was closed.
    fn with_conn<T>(&mut self, op: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let conn = self.db.connection()?;
        op(conn)
    }

    fn report_failure(&mut self, action: &str, err: &anyhow::Error) {
        error!(action, error = %format!("{err:#}"), "operation failed");
        self.set_status(
            format!("Could not {action}: {}", surface_error(err)),
            StatusKind::Error,
        );
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Menu(menu) => self.draw_menu(frame, content_area, menu),
            Screen::Recipes(list) => self.draw_recipes(frame, content_area, list),
            Screen::Authors(list) => self.draw_authors(frame, content_area, list),
            Screen::Ingredients(list) => self.draw_ingredients(frame, content_area, list),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Normal => {}
            Mode::AddingAuthor(form) => draw_form(frame, area, "Add Author", form),
            Mode::AddingRecipe(form) => draw_form(frame, area, "Add Recipe", form),
            Mode::AddingIngredient(form) => draw_form(frame, area, "Add Ingredient", form),
            Mode::Attaching(state) => draw_form(
                frame,
                area,
                &format!("Add Ingredient to {}", state.recipe_title),
                &state.form,
            ),
            Mode::ConfirmAttachAnother(state) => {
                let question = if state.attached == 0 {
                    format!("Add an ingredient to {}?", state.recipe_title)
                } else {
                    format!("Add another ingredient to {}?", state.recipe_title)
                };
                draw_confirm(frame, area, "Ingredients", &question);
            }
            Mode::DeletingById { target, form } => draw_form(
                frame,
                area,
                &format!("Delete {}", capitalize(target.noun())),
                form,
            ),
            Mode::ConfirmDelete(confirm) => {
                draw_confirm(frame, area, "Confirm Delete", &confirm.question())
            }
        }
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect, menu: &MenuScreen) {
        let items: Vec<ListItem> = MenuAction::ALL
            .iter()
            .map(|action| ListItem::new(format!("{}. {}", action.number(), action.label())))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Recipe Manager").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut state = ListState::default();
        state.select(Some(menu.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_recipes(&self, frame: &mut Frame, area: Rect, list: &RecipeScreen) {
        let block = Block::default().title("Recipes").borders(Borders::ALL);
        if list.is_empty() {
            draw_empty(frame, area, block, "No recipes yet. Pick 2 on the menu to add one.");
            return;
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);

        let items: Vec<ListItem> = list
            .items
            .iter()
            .map(|details| ListItem::new(details.recipe.to_string()))
            .collect();
        let titles = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(list.selected));
        frame.render_stateful_widget(titles, columns[0], &mut state);

        let lines = list.current().map(recipe_detail_lines).unwrap_or_default();
        let details = Paragraph::new(lines)
            .block(Block::default().title("Details").borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        frame.render_widget(details, columns[1]);
    }

    fn draw_authors(&self, frame: &mut Frame, area: Rect, list: &AuthorScreen) {
        let block = Block::default().title("Authors").borders(Borders::ALL);
        if list.is_empty() {
            draw_empty(frame, area, block, "No authors yet. Pick 1 on the menu to add one.");
            return;
        }

        let items: Vec<ListItem> = list
            .items
            .iter()
            .map(|author| {
                let mut lines = vec![Line::from(describe_author(author))];
                if let Some(bio) = &author.bio {
                    lines.push(Line::from(Span::styled(
                        format!("    {bio}"),
                        Style::default().fg(Color::Gray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        render_list(frame, area, block, items, list.selected);
    }

    fn draw_ingredients(&self, frame: &mut Frame, area: Rect, list: &IngredientScreen) {
        let block = Block::default().title("Ingredients").borders(Borders::ALL);
        if list.is_empty() {
            draw_empty(
                frame,
                area,
                block,
                "No ingredients yet. Pick 3 on the menu to add one.",
            );
            return;
        }

        let items: Vec<ListItem> = list
            .items
            .iter()
            .map(|ingredient: &Ingredient| ListItem::new(ingredient.to_string()))
            .collect();

        render_list(frame, area, block, items, list.selected);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (
                _,
                Mode::AddingAuthor(_)
                | Mode::AddingRecipe(_)
                | Mode::AddingIngredient(_)
                | Mode::Attaching(_)
                | Mode::DeletingById { .. },
            ) => &[("[Tab]", " Next field   "), ("[Enter]", " Save   "), ("[Esc]", " Cancel")],
            (_, Mode::ConfirmAttachAnother(_) | Mode::ConfirmDelete(_)) => {
                &[("[y]", " Yes   "), ("[n]", " No")]
            }
            (Screen::Menu(_), Mode::Normal) => {
                &[("[1-9]", " Choose   "), ("[↑↓ Enter]", " Select   "), ("[q]", " Quit")]
            }
            (Screen::Recipes(_), Mode::Normal) => &[
                ("[↑↓]", " Navigate   "),
                ("[+]", " Add ingredients   "),
                ("[-]", " Delete   "),
                ("[Esc]", " Menu   "),
                ("[q]", " Quit"),
            ],
            (Screen::Authors(_) | Screen::Ingredients(_), Mode::Normal) => &[
                ("[↑↓]", " Navigate   "),
                ("[-]", " Delete   "),
                ("[Esc]", " Menu   "),
                ("[q]", " Quit"),
            ],
        };

        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, text)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(text.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }
}

/// Shared arrow-key handling for the list screens.
fn navigate<T>(list: &mut ListScreen<T>, code: KeyCode) {
    match code {
        KeyCode::Up => list.move_selection(-1),
        KeyCode::Down => list.move_selection(1),
        KeyCode::PageUp => list.move_selection(-5),
        KeyCode::PageDown => list.move_selection(5),
        KeyCode::Home => list.select_first(),
        KeyCode::End => list.select_last(),
        _ => {}
    }
}

/// Keys every form understands besides Enter and Esc.
fn edit_form<F: FormField>(form: &mut Form<F>, code: KeyCode) {
    match code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(ch) => {
            if form.push_char(ch) {
                form.error = None;
            }
        }
        _ => {}
    }
}

fn describe_recipe(recipe: &Recipe) -> String {
    format!(
        "{recipe} (prep {}, cook {})",
        format_minutes(recipe.prep_minutes),
        format_minutes(recipe.cook_minutes)
    )
}

fn describe_author(author: &Author) -> String {
    if author.email.is_empty() {
        author.to_string()
    } else {
        format!("{author} <{}>", author.email)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Everything shown in the recipe detail pane.
fn recipe_detail_lines(details: &RecipeDetails) -> Vec<Line<'static>> {
    let recipe = &details.recipe;
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let author = match &details.author_name {
        Some(name) => format!("By {name} (#{})", recipe.author_id),
        None => format!("By unknown author #{}", recipe.author_id),
    };

    let mut lines = vec![
        Line::from(Span::styled(recipe.title.clone(), heading)),
        Line::from(Span::styled(author, Style::default().fg(Color::Gray))),
        Line::from(format!(
            "Prep {}   Cook {}   Total {}",
            format_minutes(recipe.prep_minutes),
            format_minutes(recipe.cook_minutes),
            format_minutes(recipe.total_minutes())
        )),
        Line::from(""),
        Line::from(Span::styled("Description", heading)),
        Line::from(recipe.description.clone()),
        Line::from(""),
        Line::from(Span::styled("Instructions", heading)),
        Line::from(recipe.instructions.clone()),
        Line::from(""),
        Line::from(Span::styled("Ingredients", heading)),
    ];

    if details.ingredients.is_empty() {
        lines.push(Line::from(Span::styled(
            "  none yet, press + to add some",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.extend(
            details
                .ingredients
                .iter()
                .map(|line| Line::from(format!("  {}", line.display_line()))),
        );
    }

    lines
}

fn render_list(frame: &mut Frame, area: Rect, block: Block, items: Vec<ListItem>, selected: usize) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Yellow))
        .highlight_symbol("▶ ");
    let mut state = ListState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_empty(frame: &mut Frame, area: Rect, block: Block, message: &str) {
    let paragraph = Paragraph::new(message.to_string())
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_form<F: FormField>(frame: &mut Frame, area: Rect, title: &str, form: &Form<F>) {
    let popup_area = centered_rect(70, 50, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    frame.render_widget(Paragraph::new(form.lines()), inner);

    let (col, row) = form.cursor_offset();
    let cursor = Position {
        x: inner
            .x
            .saturating_add(col)
            .min(inner.right().saturating_sub(1)),
        y: inner
            .y
            .saturating_add(row)
            .min(inner.bottom().saturating_sub(1)),
    };
    frame.set_cursor_position(cursor);
}

fn draw_confirm(frame: &mut Frame, area: Rect, title: &str, question: &str) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(question.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "y / Enter to confirm, n / Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    use super::*;
    use crate::db::test_support::scratch_db;
    use crate::db::{create_author, create_recipe, fetch_recipe_ingredients};
    use crate::models::{NewAuthor, NewIngredient, NewRecipe};

    fn app() -> (TempDir, App) {
        let (dir, db) = scratch_db();
        (dir, App::new(db))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(code).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    /// Type one value per field, tabbing between them.
    fn fill(app: &mut App, values: &[&str]) {
        for (idx, value) in values.iter().enumerate() {
            if idx > 0 {
                press(app, KeyCode::Tab);
            }
            type_text(app, value);
        }
    }

    fn rows(app: &mut App, table: &str) -> i64 {
        app.db
            .connection()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    fn status(app: &App) -> (StatusKind, String) {
        let status = app.status.as_ref().expect("a status message");
        (status.kind, status.text.clone())
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn added_author_shows_up_in_author_list() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('1'));
        fill(&mut app, &["Ricardo", "ricardo@example.com", ""]);
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(rows(&mut app, "author"), 1);
        assert_eq!(status(&app).0, StatusKind::Info);

        press(&mut app, KeyCode::Char('5'));
        let Screen::Authors(list) = &app.screen else {
            panic!("expected the author list");
        };
        assert_eq!(list.items.len(), 1);
        assert!(render(&app).contains("Ricardo <ricardo@example.com>"));
    }

    #[test]
    fn out_of_range_health_score_never_reaches_storage() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('3'));
        fill(&mut app, &["Salt", ""]);

        for bad in ["0", "6", "-1", "42", "three"] {
            type_text(&mut app, bad);
            press(&mut app, KeyCode::Enter);
            let Mode::AddingIngredient(form) = &app.mode else {
                panic!("form should stay open for {bad}");
            };
            assert_eq!(form.active, IngredientField::HealthScore);
            assert!(form.error.is_some());
            assert_eq!(rows(&mut app, "ingredient"), 0);
            for _ in bad.chars() {
                press(&mut app, KeyCode::Backspace);
            }
        }

        type_text(&mut app, "3");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(rows(&mut app, "ingredient"), 1);
    }

    #[test]
    fn negative_minutes_never_reach_storage() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('2'));
        fill(&mut app, &["Soup", "Hot", "Boil", "-5", "10", "1"]);
        press(&mut app, KeyCode::Enter);

        let Mode::AddingRecipe(form) = &app.mode else {
            panic!("form should stay open");
        };
        assert_eq!(form.active, RecipeField::PrepMinutes);
        assert_eq!(form.error.as_deref(), Some("Prep time cannot be negative."));
        assert_eq!(rows(&mut app, "recipe"), 0);
    }

    #[test]
    fn deleting_unknown_id_reports_not_found() {
        let (_dir, mut app) = app();
        {
            let conn = app.db.connection().unwrap();
            create_author(conn, &NewAuthor::new("Ricardo", "", "").unwrap()).unwrap();
        }

        press(&mut app, KeyCode::Char('8'));
        type_text(&mut app, "99999");
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(
            status(&app),
            (StatusKind::Warning, "No author with id 99999.".to_string())
        );
        assert_eq!(rows(&mut app, "author"), 1);
    }

    #[test]
    fn non_numeric_id_reprompts() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('7'));
        type_text(&mut app, "soup");
        press(&mut app, KeyCode::Enter);
        let Mode::DeletingById { target, form } = &app.mode else {
            panic!("prompt should stay open");
        };
        assert_eq!(*target, DeleteTarget::Recipe);
        assert_eq!(form.error.as_deref(), Some("Id must be a whole number."));
    }

    #[test]
    fn soup_with_salt_scenario() {
        let (_dir, mut app) = app();

        press(&mut app, KeyCode::Char('1'));
        fill(&mut app, &["Ricardo", "", ""]);
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('3'));
        fill(&mut app, &["Salt", "3"]);
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('2'));
        fill(&mut app, &["Soup", "A warm bowl", "Simmer gently", "10", "20", "1"]);
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::ConfirmAttachAnother(_)));

        press(&mut app, KeyCode::Char('y'));
        fill(&mut app, &["999", "1 tsp"]);
        press(&mut app, KeyCode::Enter);
        let Mode::Attaching(state) = &app.mode else {
            panic!("unknown ingredient should re-prompt");
        };
        assert_eq!(state.form.active, AttachField::IngredientId);
        assert_eq!(status(&app).0, StatusKind::Warning);

        for _ in 0..3 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "1");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::ConfirmAttachAnother(_)));

        press(&mut app, KeyCode::Char('n'));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(
            status(&app),
            (StatusKind::Info, "Added 1 ingredient(s) to Soup.".to_string())
        );

        press(&mut app, KeyCode::Char('4'));
        let screen = render(&app);
        assert!(screen.contains("Soup"));
        assert!(screen.contains("A warm bowl"));
        assert!(screen.contains("Simmer gently"));
        assert!(screen.contains("1 tsp de Salt"));
    }

    #[test]
    fn storage_error_ends_attach_loop() {
        let (_dir, mut app) = app();
        {
            let conn = app.db.connection().unwrap();
            create_ingredient(conn, &NewIngredient::new("Salt", "3").unwrap()).unwrap();
        }
        let orphan = Recipe {
            id: 4242,
            title: "Ghost".to_string(),
            description: String::new(),
            instructions: String::new(),
            prep_minutes: 0,
            cook_minutes: 0,
            author_id: 1,
        };
        app.mode = Mode::Attaching(AttachState::for_recipe(&orphan));

        fill(&mut app, &["1", "1 tsp"]);
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status(&app).0, StatusKind::Error);
        assert_eq!(rows(&mut app, "recipe_ingredient"), 0);
    }

    #[test]
    fn recipe_with_unknown_author_is_reported_and_returns_to_menu() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('2'));
        fill(&mut app, &["Soup", "Hot", "Boil", "5", "10", "77"]);
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        let (kind, text) = status(&app);
        assert_eq!(kind, StatusKind::Error);
        assert!(text.starts_with("Could not add the recipe"));
        assert_eq!(rows(&mut app, "recipe"), 0);
    }

    #[test]
    fn deleting_author_from_list_cascades_to_recipes() {
        let (_dir, mut app) = app();
        {
            let conn = app.db.connection().unwrap();
            let author = create_author(conn, &NewAuthor::new("Ricardo", "", "").unwrap()).unwrap();
            for title in ["Soup", "Stew"] {
                let recipe =
                    NewRecipe::new(title, "Hot", "Cook", "5", "10", &author.id.to_string())
                        .unwrap();
                create_recipe(conn, &recipe).unwrap();
            }
        }

        press(&mut app, KeyCode::Char('4'));
        assert!(render(&app).contains("Stew"));
        press(&mut app, KeyCode::Esc);

        press(&mut app, KeyCode::Char('5'));
        press(&mut app, KeyCode::Char('-'));
        let Mode::ConfirmDelete(ConfirmDelete::Author { recipes, .. }) = &app.mode else {
            panic!("expected an author delete confirmation");
        };
        assert_eq!(*recipes, 2);

        press(&mut app, KeyCode::Char('y'));
        assert_eq!(rows(&mut app, "author"), 0);
        assert_eq!(rows(&mut app, "recipe"), 0);
        let Screen::Authors(list) = &app.screen else {
            panic!("should stay on the author list");
        };
        assert!(list.is_empty());
    }

    #[test]
    fn attach_from_recipe_list_targets_selected_recipe() {
        let (_dir, mut app) = app();
        let recipe_id = {
            let conn = app.db.connection().unwrap();
            let author = create_author(conn, &NewAuthor::new("Ricardo", "", "").unwrap()).unwrap();
            create_ingredient(conn, &NewIngredient::new("Carrot", "5").unwrap()).unwrap();
            let recipe =
                NewRecipe::new("Soup", "Hot", "Cook", "5", "10", &author.id.to_string()).unwrap();
            create_recipe(conn, &recipe).unwrap().id
        };

        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char('+'));
        fill(&mut app, &["1", "2"]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);

        let conn = app.db.connection().unwrap();
        let lines = fetch_recipe_ingredients(conn, recipe_id).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].display_line(), "2 de Carrot");
        assert!(render(&app).contains("2 de Carrot"));
    }

    #[test]
    fn quit_from_menu() {
        let (_dir, mut app) = app();
        assert!(!app.handle_key(KeyCode::Char('4')).unwrap());
        assert!(!app.handle_key(KeyCode::Esc).unwrap());
        assert!(app.handle_key(KeyCode::Char('9')).unwrap());
        app.shutdown().unwrap();
        app.shutdown().unwrap();
    }
}
