//! The menu document.
//!
//! Everything on the page is a literal: the offer table and the item list
//! live in the typed tables below, the stylesheet is a static asset, and
//! `templates/menu.html` lays them out. The markup is rendered once and
//! reused for the life of the process.

use askama::Template;
use std::sync::OnceLock;

/// Stylesheet embedded into the page's `<head>`
pub const STYLESHEET: &str = include_str!("../assets/menu.css");

pub const DOCUMENT_TITLE: &str = "Our Menu - Food & Drinks";
/// Carried as `subject`/`description` metadata in the page head
pub const DOCUMENT_SUBJECT: &str = "Pizza Restaurant Menu";
pub const MENU_TITLE: &str = "Our Menu";
pub const MENU_LABEL: &str = "FOOD & DRINKS";
pub const HEADER_DECORATION: &str = "🍅 🍅";
pub const SPECIAL_TITLE: &str = "Paulo's Super Special";

/// A row of the pricing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offer {
    pub name: &'static str,
    pub small: &'static str,
    pub medium: &'static str,
    pub large: &'static str,
}

/// A named dish in the item list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub name: &'static str,
    pub description: &'static str,
}

pub const OFFERS: [Offer; 3] = [
    Offer {
        name: "2 for 1 Pizza",
        small: "$26.99",
        medium: "$32.99",
        large: "$37.99",
    },
    Offer {
        name: "Single Pizza",
        small: "$15.99",
        medium: "$18.99",
        large: "$21.99",
    },
    Offer {
        name: "ALL BUT THE COOK (2 for 1)",
        small: "$28.99",
        medium: "$35.99",
        large: "$41.99",
    },
];

pub const ITEMS: [MenuItem; 6] = [
    MenuItem {
        name: "House Special",
        description: "Pepperoni, Canadian Ham, Mushrooms, Olives, Onions, Green Peppers, Cheese & Tomato Sauce.",
    },
    MenuItem {
        name: "The Vegetarian",
        description: "Olives, Mushrooms, Pineapple, Green Peppers, Tomatoes, Onions, Cheese & Tomato Sauce.",
    },
    MenuItem {
        name: "Cook's Special",
        description: "Lean Beef, Tomatoes, Onions, Feta Cheese, Cheese & Tomato Sauce.",
    },
    MenuItem {
        name: "Meat Lovers",
        description: "Salami, Pepperoni, Ham, Lean Beef, Bacon, Cheese & Tomato Sauce.",
    },
    MenuItem {
        name: "Power Pizza",
        description: "Crumbled Bacon, Fresh Mushrooms, Ground Beef, Italian Sausage, Cheese & Tomato Sauce.",
    },
    MenuItem {
        name: "Spinach Special",
        description: "Spinach, Tomatoes, Feta cheese, Cheese & Tomato Sauce.",
    },
];

/// Page template; the `.html` extension turns on escaping for every field
/// except the stylesheet.
#[derive(Template)]
#[template(path = "menu.html")]
struct MenuTemplate<'a> {
    title: &'a str,
    subject: &'a str,
    stylesheet: &'a str,
    menu_title: &'a str,
    menu_label: &'a str,
    decoration: &'a str,
    special_title: &'a str,
    offers: &'a [Offer],
    items: &'a [MenuItem],
}

impl MenuTemplate<'static> {
    fn house_menu() -> Self {
        Self {
            title: DOCUMENT_TITLE,
            subject: DOCUMENT_SUBJECT,
            stylesheet: STYLESHEET,
            menu_title: MENU_TITLE,
            menu_label: MENU_LABEL,
            decoration: HEADER_DECORATION,
            special_title: SPECIAL_TITLE,
            offers: &OFFERS,
            items: &ITEMS,
        }
    }
}

static MENU_HTML: OnceLock<String> = OnceLock::new();

/// The menu markup. Identical on every call.
pub fn menu_html() -> &'static str {
    MENU_HTML.get_or_init(|| {
        // Every field is a plain string literal; rendering cannot fail.
        build_menu_html().expect("menu template renders")
    })
}

/// Render the menu markup from the literal tables.
///
/// Prefer [`menu_html`], which builds this once and caches it.
pub fn build_menu_html() -> askama::Result<String> {
    MenuTemplate::house_menu().render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn select_text(doc: &Html, css: &str) -> Vec<String> {
        let sel = Selector::parse(css).unwrap();
        doc.select(&sel)
            .map(|e| e.text().collect::<String>().trim().to_string())
            .collect()
    }

    #[test]
    fn markup_is_identical_across_calls() {
        let built = build_menu_html().unwrap();
        assert_eq!(built, build_menu_html().unwrap());
        assert_eq!(menu_html(), built);
        assert!(std::ptr::eq(menu_html(), menu_html()));
    }

    #[test]
    fn header_band_has_title_label_and_decoration() {
        let doc = Html::parse_document(menu_html());
        assert_eq!(select_text(&doc, ".header-dark .menu-title"), vec!["Our Menu"]);
        assert_eq!(select_text(&doc, ".header-dark .food-drinks"), vec!["FOOD & DRINKS"]);
        assert_eq!(select_text(&doc, ".header-decoration"), vec!["🍅 🍅"]);
        assert_eq!(select_text(&doc, "title"), vec!["Our Menu - Food & Drinks"]);
    }

    #[test]
    fn pricing_table_has_three_offers_in_three_sizes() {
        let doc = Html::parse_document(menu_html());
        assert_eq!(
            select_text(&doc, ".price-table thead th"),
            vec!["Pizza", "Small", "Medium", "Large"]
        );
        let rows = Selector::parse(".price-table tbody tr").unwrap();
        let cells = Selector::parse("td").unwrap();
        let table: Vec<Vec<String>> = doc
            .select(&rows)
            .map(|row| row.select(&cells).map(|c| c.text().collect()).collect())
            .collect();
        assert_eq!(table.len(), 3);
        assert_eq!(table[1], vec!["Single Pizza", "$15.99", "$18.99", "$21.99"]);
        assert!(table.iter().all(|r| r.len() == 4));
        assert!(table.iter().flat_map(|r| &r[1..]).all(|p| p.starts_with('$')));
    }

    #[test]
    fn item_list_has_six_entries_with_placeholders() {
        let doc = Html::parse_document(menu_html());
        let names = select_text(&doc, ".pizza-item .pizza-name");
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], "House Special");
        assert_eq!(names[5], "Spinach Special");
        assert_eq!(select_text(&doc, ".pizza-item .pizza-image").len(), 6);
        assert_eq!(select_text(&doc, ".pizza-item .pizza-desc").len(), 6);
    }

    #[test]
    fn stylesheet_resets_page_margins() {
        assert!(STYLESHEET.starts_with("@page { margin: 0; }"));
        assert!(menu_html().contains(STYLESHEET));
    }

    #[test]
    fn text_is_escaped_and_round_trips() {
        let html = menu_html();
        assert!(html.contains("FOOD &amp; DRINKS"));
        assert!(!html.contains("Cook's Special"));

        let doc = Html::parse_document(html);
        let names = select_text(&doc, ".pizza-name");
        assert_eq!(names[2], "Cook's Special");
        assert_eq!(select_text(&doc, ".special-title"), vec!["Paulo's Super Special"]);
        assert!(select_text(&doc, ".pizza-desc")
            .iter()
            .all(|d| d.ends_with("Cheese & Tomato Sauce.")));
    }

    #[test]
    fn stylesheet_is_not_escaped() {
        // menu.css has quoted `content` values
        assert!(STYLESHEET.contains('\''));
        assert!(menu_html().contains(STYLESHEET));
    }

    #[test]
    fn head_carries_title_and_subject_metadata() {
        let doc = Html::parse_document(menu_html());
        let meta = |name: &str| {
            let sel = Selector::parse(&format!("meta[name=\"{}\"]", name)).unwrap();
            doc.select(&sel)
                .filter_map(|m| m.value().attr("content"))
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        assert_eq!(select_text(&doc, "head > title"), vec![DOCUMENT_TITLE]);
        assert_eq!(meta("subject"), vec![DOCUMENT_SUBJECT]);
        assert_eq!(meta("description"), vec![DOCUMENT_SUBJECT]);
        assert_eq!(meta("generator"), vec!["menu-pdf"]);
    }
}
