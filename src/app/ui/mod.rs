mod minimap;
mod panels;
mod toolbar;
