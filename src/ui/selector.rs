use std::collections::HashMap;

use egui::{Id, RichText, ScrollArea, TextEdit, Ui};

use crate::data::ski_data::Coordinate;

const PLACEHOLDER: &str = "Search Ski Areas...";
const LIST_MAX_HEIGHT: f32 = 260.0;

/// One selectable entry of the ski area search box.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOption {
    pub value: String,
    pub label: String,
    pub coords: Coordinate,
    key: String,
}

impl AreaOption {
    fn new(name: &str, coords: Coordinate) -> Self {
        Self {
            value: name.to_string(),
            label: name.to_string(),
            coords,
            key: collation_key(name),
        }
    }

    /// Substring match on the label's collation key; `key` is the query
    /// already passed through [`collation_key`].
    fn matches_key(&self, key: &str) -> bool {
        key.is_empty() || self.key.contains(key)
    }
}

/// Lowercases `text` and strips the accents of Latin letters, so that
/// `Ötztal` sorts and matches like `otztal`.
pub fn collation_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => key.push('a'),
            'ç' | 'ć' | 'č' => key.push('c'),
            'ď' | 'đ' => key.push('d'),
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => key.push('e'),
            'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => key.push('i'),
            'ľ' | 'ĺ' | 'ł' => key.push('l'),
            'ñ' | 'ń' | 'ň' => key.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => key.push('o'),
            'ŕ' | 'ř' => key.push('r'),
            'ś' | 'š' | 'ş' | 'ș' => key.push('s'),
            'ť' | 'ţ' | 'ț' => key.push('t'),
            'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => key.push('u'),
            'ý' | 'ÿ' => key.push('y'),
            'ź' | 'ż' | 'ž' => key.push('z'),
            'ß' => key.push_str("ss"),
            'æ' => key.push_str("ae"),
            'œ' => key.push_str("oe"),
            'ð' => key.push('d'),
            'þ' => key.push_str("th"),
            other => key.push(other),
        }
    }
    key
}

/// Searchable list of ski areas. Emits the coordinate of the chosen area.
pub struct AreaSelector {
    options: Vec<AreaOption>,
    query: String,
    selected: Option<usize>,
    list_hovered: bool,
}

impl AreaSelector {
    /// Builds the options from the dataset mapping, sorted by name.
    pub fn new(areas: &HashMap<String, Coordinate>) -> Self {
        let mut options: Vec<AreaOption> = areas
            .iter()
            .map(|(name, coords)| AreaOption::new(name, *coords))
            .collect();
        options.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.label.cmp(&b.label)));

        Self {
            options,
            query: String::new(),
            selected: None,
            list_hovered: false,
        }
    }

    pub fn options(&self) -> &[AreaOption] {
        &self.options
    }

    /// Options matching the current query, in presentation order.
    pub fn filtered(&self) -> Vec<&AreaOption> {
        let key = collation_key(self.query.trim());
        self.options
            .iter()
            .filter(|option| option.matches_key(&key))
            .collect()
    }

    /// The option Enter picks: the first match of a non-empty query.
    pub fn first_match(&self) -> Option<&AreaOption> {
        if self.query.trim().is_empty() {
            return None;
        }
        self.filtered().into_iter().next()
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Selects the option whose value is `value` and returns its coordinate.
    pub fn select(&mut self, value: &str) -> Option<Coordinate> {
        let index = self.options.iter().position(|option| option.value == value)?;
        self.selected = Some(index);
        self.query.clear();
        Some(self.options[index].coords)
    }

    /// Clears the current selection. Nothing is emitted.
    pub fn clear(&mut self) {
        self.selected = None;
        self.query.clear();
    }

    pub fn selected(&self) -> Option<&AreaOption> {
        self.selected.and_then(|index| self.options.get(index))
    }

    /// Draws the search box and, while it is focused, the list of matches.
    ///
    /// # Returns
    /// The coordinate of the area picked this frame, if any.
    pub fn show(&mut self, ui: &mut Ui) -> Option<Coordinate> {
        let mut picked: Option<String> = None;

        let hint = match self.selected() {
            Some(option) => RichText::new(option.label.as_str()).strong(),
            None => RichText::new(PLACEHOLDER).weak(),
        };

        let response = ui
            .horizontal(|ui| {
                let response = ui.add(
                    TextEdit::singleline(&mut self.query)
                        .id(Id::new("ski area search"))
                        .hint_text(hint)
                        .desired_width(250.0),
                );

                if (self.selected.is_some() || !self.query.is_empty())
                    && ui.small_button("✖").on_hover_text("Clear").clicked()
                {
                    self.clear();
                }
                response
            })
            .inner;

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            picked = self.first_match().map(|option| option.value.clone());
        }

        if response.has_focus() || self.list_hovered {
            let matches = self.filtered();
            let row_height = ui.spacing().interact_size.y;

            let list = egui::Frame::popup(ui.style()).show(ui, |ui| {
                if matches.is_empty() {
                    ui.label(RichText::new("No options").weak());
                    return;
                }
                ScrollArea::vertical()
                    .max_height(LIST_MAX_HEIGHT)
                    .auto_shrink([false, true])
                    .show_rows(ui, row_height, matches.len(), |ui, rows| {
                        for option in &matches[rows] {
                            if ui.selectable_label(false, option.label.as_str()).clicked() {
                                picked = Some(option.value.clone());
                            }
                        }
                    });
            });
            self.list_hovered = list.response.hovered();
        } else {
            self.list_hovered = false;
        }

        let value = picked?;
        self.list_hovered = false;
        response.surrender_focus();
        self.select(&value)
    }
}
