pub mod terms_search;
